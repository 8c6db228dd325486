use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Review-scheduling record for one (user, question) pair. Created on first
/// exposure, updated after every reviewed attempt, never deleted except with
/// its user or question.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub question_id: Uuid,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub success_streak: i32,
    pub next_review_date: NaiveDate,
}

/// The scheduling fields detached from row identity, so the scheduler stays
/// a pure function from state to state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SrsState {
    pub ease_factor: f64,
    pub interval_days: i32,
    pub success_streak: i32,
    pub next_review_date: NaiveDate,
}

impl UserItem {
    pub fn srs_state(&self) -> SrsState {
        SrsState {
            ease_factor: self.ease_factor,
            interval_days: self.interval_days,
            success_streak: self.success_streak,
            next_review_date: self.next_review_date,
        }
    }
}

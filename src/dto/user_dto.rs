use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 80))]
    pub username: String,
    #[validate(email)]
    pub email: String,
}

/// Per-quiz accuracy across all of a user's attempts.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct QuizProgress {
    pub quiz_id: Uuid,
    pub quiz_title: String,
    pub attempts: i64,
    pub total_answers: i64,
    pub correct_answers: i64,
}

impl QuizProgress {
    pub fn accuracy(&self) -> f64 {
        if self.total_answers > 0 {
            self.correct_answers as f64 / self.total_answers as f64
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuizProgressOut {
    pub quiz_id: Uuid,
    pub quiz_title: String,
    pub attempts: i64,
    pub accuracy: f64,
}

impl From<QuizProgress> for QuizProgressOut {
    fn from(progress: QuizProgress) -> Self {
        let accuracy = progress.accuracy();
        Self {
            quiz_id: progress.quiz_id,
            quiz_title: progress.quiz_title,
            attempts: progress.attempts,
            accuracy,
        }
    }
}

/// A scheduling record joined with enough question context to render a
/// review queue entry.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct DueItem {
    pub question_id: Uuid,
    pub quiz_id: Uuid,
    pub prompt_text: String,
    pub ease_factor: f64,
    pub interval_days: i32,
    pub success_streak: i32,
    pub next_review_date: NaiveDate,
}

use chrono::{Duration, NaiveDate};

use crate::models::user_item::SrsState;

pub const INITIAL_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const EASE_PENALTY: f64 = 0.1;
pub const MAX_INTERVAL_DAYS: i32 = 365;

/// Spaced-repetition scheduler. Every operation is a pure function of the
/// prior state and the review outcome; persistence is the caller's problem
/// (and must happen in the same transaction as the attempt record).
pub struct SrsService;

impl SrsService {
    /// State on first exposure to an item: due immediately.
    pub fn initial_state(today: NaiveDate) -> SrsState {
        SrsState {
            ease_factor: INITIAL_EASE_FACTOR,
            interval_days: 0,
            success_streak: 0,
            next_review_date: today,
        }
    }

    /// Interval progression on success: 1 day, then 6 days, then the previous
    /// interval scaled by the ease factor, capped at a year.
    pub fn next_interval(success_streak: i32, ease_factor: f64, previous_interval: i32) -> i32 {
        let days = if success_streak <= 1 {
            1
        } else if success_streak == 2 {
            6
        } else {
            let scaled = (previous_interval.max(1) as f64 * ease_factor).round() as i32;
            scaled.max(1)
        };
        days.min(MAX_INTERVAL_DAYS)
    }

    /// Transition on one graded review. Success extends the streak and grows
    /// the interval; failure resets both and nudges the ease factor down to
    /// its floor of 1.3.
    pub fn review(prior: &SrsState, was_correct: bool, today: NaiveDate) -> SrsState {
        if was_correct {
            let success_streak = prior.success_streak + 1;
            let interval_days =
                Self::next_interval(success_streak, prior.ease_factor, prior.interval_days);
            SrsState {
                ease_factor: prior.ease_factor,
                interval_days,
                success_streak,
                next_review_date: today + Duration::days(interval_days as i64),
            }
        } else {
            SrsState {
                ease_factor: (prior.ease_factor - EASE_PENALTY).max(MIN_EASE_FACTOR),
                interval_days: 1,
                success_streak: 0,
                next_review_date: today + Duration::days(1),
            }
        }
    }
}

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::user_dto::{DueItem, QuizProgress};
use crate::error::{Error, Result};
use crate::models::user::User;
use crate::models::user_item::UserItem;

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, username: &str, email: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"INSERT INTO users (username, email) VALUES ($1, $2) RETURNING *"#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        let user = sqlx::query_as::<_, User>(r#"SELECT * FROM users WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {} not found", user_id)))?;
        Ok(user)
    }

    /// Per-quiz answer accuracy across all of the user's attempts.
    pub async fn progress(&self, user_id: Uuid) -> Result<Vec<QuizProgress>> {
        let rows = sqlx::query_as::<_, QuizProgress>(
            r#"
            SELECT qa.quiz_id,
                   q.title AS quiz_title,
                   COUNT(DISTINCT qa.id) AS attempts,
                   COUNT(ua.id) AS total_answers,
                   COUNT(ua.id) FILTER (WHERE ua.was_correct) AS correct_answers
            FROM quiz_attempts qa
            JOIN quizzes q ON q.id = qa.quiz_id
            LEFT JOIN user_answers ua ON ua.attempt_id = qa.id
            WHERE qa.user_id = $1
            GROUP BY qa.quiz_id, q.title
            ORDER BY q.title
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Every scheduling record the user has, soonest due first.
    pub async fn srs_items(&self, user_id: Uuid) -> Result<Vec<UserItem>> {
        let items = sqlx::query_as::<_, UserItem>(
            r#"SELECT * FROM user_items WHERE user_id = $1 ORDER BY next_review_date"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// The review queue: items due on or before the given day.
    pub async fn due_items(&self, user_id: Uuid, today: NaiveDate) -> Result<Vec<DueItem>> {
        let items = sqlx::query_as::<_, DueItem>(
            r#"
            SELECT ui.question_id, q.quiz_id, q.prompt_text,
                   ui.ease_factor, ui.interval_days, ui.success_streak, ui.next_review_date
            FROM user_items ui
            JOIN questions q ON q.id = ui.question_id
            WHERE ui.user_id = $1 AND ui.next_review_date <= $2
            ORDER BY ui.next_review_date, q.prompt_text
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }
}

use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::attempt::QuizAttempt;
use crate::models::question::{Question, QuestionRow, Verdict};
use crate::models::user_item::UserItem;
use crate::services::srs_service::SrsService;
use crate::utils::time;

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn start_attempt(
        &self,
        user_id: Uuid,
        quiz_id: Uuid,
    ) -> Result<(QuizAttempt, Vec<Question>)> {
        let exists: Option<Uuid> = sqlx::query_scalar(r#"SELECT id FROM quizzes WHERE id = $1"#)
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("quiz {} not found", quiz_id)));
        }

        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"INSERT INTO quiz_attempts (user_id, quiz_id) VALUES ($1, $2) RETURNING *"#,
        )
        .bind(user_id)
        .bind(quiz_id)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, quiz_id, question_type, prompt_text, prompt_image_url,
                   answer_explanation, "position", details
            FROM questions WHERE quiz_id = $1 ORDER BY "position"
            "#,
        )
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        let questions: Vec<Question> = rows
            .into_iter()
            .map(QuestionRow::into_question)
            .collect::<Result<_>>()?;

        Ok((attempt, questions))
    }

    pub async fn get_attempt(&self, attempt_id: Uuid) -> Result<QuizAttempt> {
        let attempt =
            sqlx::query_as::<_, QuizAttempt>(r#"SELECT * FROM quiz_attempts WHERE id = $1"#)
                .bind(attempt_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| Error::NotFound(format!("attempt {} not found", attempt_id)))?;
        Ok(attempt)
    }

    /// Grade one submission. Validation runs first and any rejection
    /// (`InvalidResponseShape`, `UnknownComponentReference`) surfaces before
    /// anything is written; a scored answer and the updated scheduling state
    /// are then persisted in a single transaction.
    pub async fn submit_answer(
        &self,
        attempt_id: Uuid,
        question_id: Uuid,
        response: &JsonValue,
    ) -> Result<Verdict> {
        let attempt = self.get_attempt(attempt_id).await?;
        if attempt.completed_at.is_some() {
            return Err(Error::BadRequest(format!(
                "attempt {} is already finished",
                attempt_id
            )));
        }

        let row = sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, quiz_id, question_type, prompt_text, prompt_image_url,
                   answer_explanation, "position", details
            FROM questions WHERE id = $1
            "#,
        )
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("question {} not found", question_id)))?;
        let question = row.into_question()?;

        if question.quiz_id != attempt.quiz_id {
            return Err(Error::BadRequest(
                "question does not belong to this attempt's quiz".to_string(),
            ));
        }

        let verdict = question.validate_answer(response)?;
        let details = verdict
            .details
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let today = time::today();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO user_answers
                (attempt_id, question_id, response, was_correct, feedback, details)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(attempt.id)
        .bind(question.id)
        .bind(response)
        .bind(verdict.is_correct)
        .bind(&verdict.feedback)
        .bind(details)
        .execute(&mut *tx)
        .await?;

        let existing = sqlx::query_as::<_, UserItem>(
            r#"SELECT * FROM user_items WHERE user_id = $1 AND question_id = $2 FOR UPDATE"#,
        )
        .bind(attempt.user_id)
        .bind(question.id)
        .fetch_optional(&mut *tx)
        .await?;

        let prior = existing
            .as_ref()
            .map(UserItem::srs_state)
            .unwrap_or_else(|| SrsService::initial_state(today));
        let next = SrsService::review(&prior, verdict.is_correct, today);

        sqlx::query(
            r#"
            INSERT INTO user_items
                (user_id, question_id, ease_factor, interval_days, success_streak, next_review_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, question_id) DO UPDATE
            SET ease_factor = EXCLUDED.ease_factor,
                interval_days = EXCLUDED.interval_days,
                success_streak = EXCLUDED.success_streak,
                next_review_date = EXCLUDED.next_review_date
            "#,
        )
        .bind(attempt.user_id)
        .bind(question.id)
        .bind(next.ease_factor)
        .bind(next.interval_days)
        .bind(next.success_streak)
        .bind(next.next_review_date)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(verdict)
    }

    /// Close the attempt and record the fraction of answers that were
    /// correct.
    pub async fn finish_attempt(&self, attempt_id: Uuid) -> Result<(QuizAttempt, i64, i64)> {
        let attempt = self.get_attempt(attempt_id).await?;

        let (total, correct): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COUNT(*) FILTER (WHERE was_correct)
            FROM user_answers WHERE attempt_id = $1
            "#,
        )
        .bind(attempt.id)
        .fetch_one(&self.pool)
        .await?;

        let score = if total > 0 {
            correct as f64 / total as f64
        } else {
            0.0
        };

        let updated = sqlx::query_as::<_, QuizAttempt>(
            r#"
            UPDATE quiz_attempts
            SET completed_at = NOW(), score = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(attempt.id)
        .bind(score)
        .fetch_one(&self.pool)
        .await?;

        Ok((updated, correct, total))
    }
}

use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::question_dto::QuestionInput;
use crate::error::{Error, Result};
use crate::models::question::{Question, QuestionRow};
use crate::models::quiz::Quiz;

const QUESTION_COLUMNS: &str = r#"id, quiz_id, question_type, prompt_text, prompt_image_url, answer_explanation, "position", details"#;

#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_quiz(
        &self,
        creator_id: Uuid,
        title: &str,
        description: Option<String>,
        language: Option<String>,
        is_public: bool,
    ) -> Result<Quiz> {
        let quiz = sqlx::query_as::<_, Quiz>(
            r#"
            INSERT INTO quizzes (creator_id, title, description, language, is_public)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(creator_id)
        .bind(title)
        .bind(description)
        .bind(language)
        .bind(is_public)
        .fetch_one(&self.pool)
        .await?;
        Ok(quiz)
    }

    pub async fn get_quiz(&self, quiz_id: Uuid) -> Result<Quiz> {
        let quiz = sqlx::query_as::<_, Quiz>(r#"SELECT * FROM quizzes WHERE id = $1"#)
            .bind(quiz_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("quiz {} not found", quiz_id)))?;
        Ok(quiz)
    }

    /// A quiz's questions with their components, in presentation order.
    pub async fn list_questions(&self, quiz_id: Uuid) -> Result<Vec<Question>> {
        let rows = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"SELECT {} FROM questions WHERE quiz_id = $1 ORDER BY "position""#,
            QUESTION_COLUMNS
        ))
        .bind(quiz_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(QuestionRow::into_question).collect()
    }

    pub async fn get_question(&self, question_id: Uuid) -> Result<Question> {
        let row = sqlx::query_as::<_, QuestionRow>(&format!(
            r#"SELECT {} FROM questions WHERE id = $1"#,
            QUESTION_COLUMNS
        ))
        .bind(question_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("question {} not found", question_id)))?;
        row.into_question()
    }

    /// Author a question into a quiz. The definition is validated before
    /// anything touches the database; position is appended at the end.
    pub async fn add_question(&self, quiz_id: Uuid, input: QuestionInput) -> Result<Question> {
        let quiz = self.get_quiz(quiz_id).await?;

        let next_position: i32 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX("position") + 1, 0) FROM questions WHERE quiz_id = $1"#,
        )
        .bind(quiz.id)
        .fetch_one(&self.pool)
        .await?;

        let question = input.into_question(quiz.id, next_position)?;
        question.validate_definition()?;

        sqlx::query(
            r#"
            INSERT INTO questions
                (id, quiz_id, question_type, prompt_text, prompt_image_url,
                 answer_explanation, "position", details)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(question.id)
        .bind(question.quiz_id)
        .bind(question.question_type.as_str())
        .bind(&question.prompt_text)
        .bind(&question.prompt_image_url)
        .bind(&question.answer_explanation)
        .bind(question.position)
        .bind(serde_json::to_value(&question.details)?)
        .execute(&self.pool)
        .await?;

        Ok(question)
    }

    /// Replace a question's definition in place. The question id (and with it
    /// any scheduling state pointing at the item) survives the edit; the
    /// owned components are re-issued with the new definition.
    pub async fn update_question(
        &self,
        question_id: Uuid,
        input: QuestionInput,
    ) -> Result<Question> {
        let existing = self.get_question(question_id).await?;

        let mut question = input.into_question(existing.quiz_id, existing.position)?;
        question.id = existing.id;
        question.validate_definition()?;

        sqlx::query(
            r#"
            UPDATE questions
            SET question_type = $2, prompt_text = $3, prompt_image_url = $4,
                answer_explanation = $5, details = $6
            WHERE id = $1
            "#,
        )
        .bind(question.id)
        .bind(question.question_type.as_str())
        .bind(&question.prompt_text)
        .bind(&question.prompt_image_url)
        .bind(&question.answer_explanation)
        .bind(serde_json::to_value(&question.details)?)
        .execute(&self.pool)
        .await?;

        Ok(question)
    }

    /// Components live in the question row, so deleting it drops them too;
    /// answers and scheduling rows cascade through foreign keys.
    pub async fn delete_question(&self, question_id: Uuid) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM questions WHERE id = $1"#)
            .bind(question_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("question {} not found", question_id)));
        }
        Ok(())
    }

    pub async fn delete_quiz(&self, quiz_id: Uuid) -> Result<()> {
        let result = sqlx::query(r#"DELETE FROM quizzes WHERE id = $1"#)
            .bind(quiz_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("quiz {} not found", quiz_id)));
        }
        Ok(())
    }
}

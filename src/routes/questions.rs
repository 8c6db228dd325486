use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::dto::question_dto::QuestionInput;
use crate::AppState;

/// Full serialized questions for a quiz, in presentation order. This is the
/// wire shape clients branch on via the `type` tag.
#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    state.quiz_service.get_quiz(quiz_id).await?;
    let questions = state.quiz_service.list_questions(quiz_id).await?;
    Ok(Json(questions).into_response())
}

#[axum::debug_handler]
pub async fn add_question(
    State(state): State<AppState>,
    Path(quiz_id): Path<Uuid>,
    Json(input): Json<QuestionInput>,
) -> crate::error::Result<Response> {
    input.validate()?;
    let question = state.quiz_service.add_question(quiz_id, input).await?;
    Ok((StatusCode::CREATED, Json(question)).into_response())
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
    Json(input): Json<QuestionInput>,
) -> crate::error::Result<Response> {
    input.validate()?;
    let question = state.quiz_service.update_question(question_id, input).await?;
    Ok(Json(question).into_response())
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(question_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    state.quiz_service.delete_question(question_id).await?;
    Ok(Json(json!({ "deleted": true })).into_response())
}

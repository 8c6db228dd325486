use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use rand::thread_rng;
use uuid::Uuid;
use validator::Validate;

use crate::dto::attempt_dto::{
    player_question, FinishAttemptResponse, StartAttemptRequest, StartAttemptResponse,
    SubmitAnswerRequest, SubmitAnswerResponse,
};
use crate::AppState;

#[axum::debug_handler]
pub async fn start_attempt(
    State(state): State<AppState>,
    Json(req): Json<StartAttemptRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let (attempt, questions) = state
        .attempt_service
        .start_attempt(req.user_id, req.quiz_id)
        .await?;
    tracing::info!(
        "Attempt {} started on quiz {} with {} questions",
        attempt.id,
        attempt.quiz_id,
        questions.len()
    );

    let mut rng = thread_rng();
    let questions = questions
        .iter()
        .map(|q| player_question(q, &mut rng))
        .collect();

    let response = StartAttemptResponse {
        attempt_id: attempt.id,
        quiz_id: attempt.quiz_id,
        started_at: attempt.started_at,
        questions,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

#[axum::debug_handler]
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
    Json(req): Json<SubmitAnswerRequest>,
) -> crate::error::Result<Response> {
    let verdict = state
        .attempt_service
        .submit_answer(attempt_id, req.question_id, &req.response)
        .await?;
    tracing::info!(
        "Question {} answered in attempt {}: correct={}",
        req.question_id,
        attempt_id,
        verdict.is_correct
    );

    let response = SubmitAnswerResponse {
        correct: verdict.is_correct,
        feedback: verdict.feedback,
        details: verdict.details,
    };
    Ok(Json(response).into_response())
}

#[axum::debug_handler]
pub async fn finish_attempt(
    State(state): State<AppState>,
    Path(attempt_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    let (attempt, correct, total) = state.attempt_service.finish_attempt(attempt_id).await?;

    let response = FinishAttemptResponse {
        attempt_id: attempt.id,
        score: attempt.score,
        correct,
        total,
    };
    Ok(Json(response).into_response())
}

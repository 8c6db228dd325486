use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use uuid::Uuid;
use validator::Validate;

use crate::dto::user_dto::{QuizProgressOut, RegisterUserRequest};
use crate::utils::time;
use crate::AppState;

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> crate::error::Result<Response> {
    req.validate()?;
    let user = state
        .user_service
        .create_user(&req.username, &req.email)
        .await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

#[axum::debug_handler]
pub async fn progress(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    state.user_service.get_user(user_id).await?;
    let rows = state.user_service.progress(user_id).await?;
    let out: Vec<QuizProgressOut> = rows.into_iter().map(QuizProgressOut::from).collect();
    Ok(Json(out).into_response())
}

#[axum::debug_handler]
pub async fn srs_overview(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    state.user_service.get_user(user_id).await?;
    let items = state.user_service.srs_items(user_id).await?;
    Ok(Json(items).into_response())
}

#[axum::debug_handler]
pub async fn due_reviews(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> crate::error::Result<Response> {
    state.user_service.get_user(user_id).await?;
    let items = state.user_service.due_items(user_id, time::today()).await?;
    Ok(Json(items).into_response())
}

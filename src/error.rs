use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The submitted response does not have the shape the question variant
    /// expects (e.g. a scalar where a list of option ids is required).
    #[error("Invalid response shape: {0}")]
    InvalidResponseShape(String),

    /// The response names an option/blank/pair id that does not belong to
    /// the question being answered.
    #[error("Unknown component reference: {0}")]
    UnknownComponentReference(String),

    /// Authoring-time rejection: the question definition violates a variant
    /// invariant. Raised before persistence, never at answer time.
    #[error("Malformed question definition: {0}")]
    MalformedQuestionDefinition(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::BadRequest(_) => "bad_request",
            Error::NotFound(_) => "not_found",
            Error::Database(_) => "database_error",
            Error::Validation(_) => "validation_error",
            Error::Json(_) => "json_error",
            Error::InvalidResponseShape(_) => "invalid_response_shape",
            Error::UnknownComponentReference(_) => "unknown_component_reference",
            Error::MalformedQuestionDefinition(_) => "malformed_question_definition",
            Error::Anyhow(_) => "internal_error",
            Error::Internal(_) => "internal_error",
            Error::Io(_) => "io_error",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let code = self.code();
        let (status, message) = match self {
            Error::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Error::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Error::InvalidResponseShape(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Error::UnknownComponentReference(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Error::MalformedQuestionDefinition(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            Error::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            Error::Anyhow(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_string(),
            ),
        };

        let body = Json(json!({ "error": code, "message": message }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}

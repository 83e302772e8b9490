use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::documents::ExtractionError;

/// Failures of the matching pipeline.
///
/// Malformed model output never surfaces here; the extractor falls back to defaults.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{field} text is empty")]
    EmptyInput { field: &'static str },

    #[error("{field} exceeds maximum length of {max} characters (got {actual})")]
    LengthExceeded {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Text extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<MatchError> for AppError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::ModelUnavailable(msg) => AppError::Llm(msg),
            other => AppError::Validation(other.to_string()),
        }
    }
}

impl From<ExtractionError> for AppError {
    fn from(err: ExtractionError) -> Self {
        MatchError::from(err).into()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (StatusCode::BAD_GATEWAY, "LLM_ERROR", msg.clone())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

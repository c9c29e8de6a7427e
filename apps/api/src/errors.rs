use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::kakao::OAuthError;
use crate::documents::DocumentError;
use crate::interview::history::HistoryError;
use crate::llm_client::LlmError;
use crate::records::store::RecordError;
use crate::speech::SpeechError;
use crate::storage::StorageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("History store error: {0}")]
    History(#[from] HistoryError),

    #[error("Record store error: {0}")]
    Records(#[from] RecordError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    #[error("OAuth error: {0}")]
    OAuth(#[from] OAuthError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Document(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DOCUMENT_ERROR",
                e.to_string(),
            ),
            AppError::Storage(e) => match e {
                StorageError::InvalidUrl(_) | StorageError::UnsupportedScheme(_) => {
                    (StatusCode::BAD_REQUEST, "INVALID_URL", e.to_string())
                }
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", e.to_string()),
                StorageError::Backend(msg) => {
                    tracing::error!("S3 error: {msg}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "S3_ERROR",
                        "A storage error occurred".to_string(),
                    )
                }
            },
            AppError::History(e) => {
                tracing::error!("History store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "HISTORY_ERROR",
                    "An interview history error occurred".to_string(),
                )
            }
            AppError::Records(e) => {
                tracing::error!("Record store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(e) => {
                tracing::error!("LLM error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::Speech(e) => {
                tracing::error!("Speech error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "SPEECH_ERROR",
                    "A speech service error occurred".to_string(),
                )
            }
            AppError::OAuth(e) => {
                tracing::error!("OAuth error: {e}");
                (StatusCode::BAD_GATEWAY, "OAUTH_ERROR", e.to_string())
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

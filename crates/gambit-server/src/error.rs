//! Error types for the session API.
//!
//! [`ApiError`] maps the analysis taxonomy onto HTTP statuses and renders
//! the standard [`ApiResponse`] envelope. Unexpected failures are logged
//! with their detail and shown to the client only as a generic message.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use gambit_core::AnalysisError;
use gambit_db::DbError;
use tracing::error;

use crate::response::ApiResponse;

/// Message shown for any failure whose detail stays server-side.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Errors that can occur in the API layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The requested session was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request was malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The engine failed or timed out.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Anything else. Detail is logged, never returned.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<AnalysisError> for ApiError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::NotFound(msg) => Self::NotFound(msg),
            AnalysisError::Validation(msg) => Self::Validation(msg),
            AnalysisError::EngineUnavailable(msg) => Self::EngineUnavailable(msg),
            AnalysisError::Unexpected(msg) => Self::Unexpected(msg),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        Self::Unexpected(e.to_string())
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Validation(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::EngineUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Analysis engine unavailable: {msg}"),
            ),
            Self::Unexpected(detail) => {
                error!(error = %detail, "Unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    GENERIC_ERROR_MESSAGE.to_owned(),
                )
            }
        };

        (status, Json(ApiResponse::fail(message))).into_response()
    }
}

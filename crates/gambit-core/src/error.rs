//! Error taxonomy for an analysis cycle.
//!
//! Every failure an orchestration cycle can surface falls into one of four
//! classes. The HTTP layer maps them to status codes; only `Unexpected`
//! hides its detail from the client.

use gambit_db::DbError;

/// Errors surfaced by [`AnalysisOrchestrator`](crate::AnalysisOrchestrator).
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// A session or user was not found. Non-fatal; the caller decides.
    #[error("not found: {0}")]
    NotFound(String),

    /// A required input was missing or malformed. Raised before any side
    /// effect.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The engine timed out or answered with a failure. No partial result
    /// was published.
    #[error("engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Anything else (store failures included).
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<DbError> for AnalysisError {
    fn from(e: DbError) -> Self {
        Self::Unexpected(e.to_string())
    }
}

/// Errors raised by an [`EngineClient`](crate::engine::EngineClient).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The request never got a response.
    #[error("engine request failed: {0}")]
    Transport(String),

    /// The engine answered with a non-success status.
    #[error("engine returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for logs.
        body: String,
    },

    /// The response body did not match the engine contract.
    #[error("engine response invalid: {0}")]
    Decode(String),
}

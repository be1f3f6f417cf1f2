//! Error types for the policy RAG system

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for policy RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// Policy RAG errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No persisted index and the embedding service could not build one
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Persisted index could not be read, written, or queried
    #[error("Index error: {0}")]
    Index(String),

    /// Embedding service call failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Language model call failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// A service call exceeded its timeout
    #[error("{service} did not respond within {secs}s")]
    Timeout { service: String, secs: u64 },

    /// Unknown conversation session
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Rejected request payload
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an index error
    pub fn index(message: impl Into<String>) -> Self {
        Self::Index(message.into())
    }

    /// Create a timeout error
    pub fn timeout(service: impl Into<String>, secs: u64) -> Self {
        Self::Timeout {
            service: service.into(),
            secs,
        }
    }

    /// Whether the caller may retry the failed turn
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Embedding(_) | Error::Llm(_) | Error::Timeout { .. } | Error::Http(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let retryable = self.is_retryable();
        let (status, error_type, message) = match &self {
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error", msg.clone()),
            Error::IndexUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "index_unavailable", msg.clone())
            }
            Error::Index(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "index_error", msg.clone()),
            Error::Embedding(msg) => (StatusCode::SERVICE_UNAVAILABLE, "embedding_error", msg.clone()),
            Error::Llm(msg) => (StatusCode::SERVICE_UNAVAILABLE, "llm_error", msg.clone()),
            Error::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout", self.to_string()),
            Error::SessionNotFound(id) => (
                StatusCode::NOT_FOUND,
                "not_found",
                format!("Session not found: {}", id),
            ),
            Error::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request", msg.clone()),
            Error::Io(err) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error", err.to_string()),
            Error::Json(err) => (StatusCode::BAD_REQUEST, "json_error", err.to_string()),
            Error::Http(err) => (StatusCode::BAD_GATEWAY, "http_error", err.to_string()),
            Error::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "retryable": retryable,
            }
        }));

        (status, body).into_response()
    }
}

//! Error types for the relay
//!
//! Every failure a handler can hit is a [`RelayError`]. The [`IntoResponse`]
//! impl below is the one place where error kinds become status codes and
//! JSON bodies.

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

/// Message used when a failure carries no description
pub const GENERIC_ERROR_MESSAGE: &str = "Internal server error";

/// Application-level errors
#[derive(Debug, Error)]
pub enum RelayError {
    /// No API key for the provider
    #[error("API key not configured")]
    ConfigurationMissing,

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Non-2xx from the provider, relayed as-is
    #[error("Upstream returned {status}")]
    UpstreamFailure { status: StatusCode, body: Value },

    /// Provider announced a stream but sent no body
    #[error("Stream not available")]
    StreamUnavailable,

    #[error("{0}")]
    BadRequest(String),

    /// Body could not be read (too large, or the connection failed)
    #[error("{message}")]
    RequestRejected { status: StatusCode, message: String },

    /// Failure on the prompt chat endpoint
    #[error("{0}")]
    Provider(String),

    #[error("{0}")]
    Internal(String),
}

impl RelayError {
    /// Wrap any error as an internal failure, keeping its description
    pub fn internal(err: impl std::fmt::Display) -> Self {
        RelayError::Internal(err.to_string())
    }

    /// Status code this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::UpstreamFailure { status, .. } => *status,
            RelayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::RequestRejected { status, .. } => *status,
            RelayError::ConfigurationMissing
            | RelayError::StreamUnavailable
            | RelayError::Provider(_)
            | RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        RelayError::internal(err)
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::internal(err)
    }
}

impl From<BytesRejection> for RelayError {
    fn from(rejection: BytesRejection) -> Self {
        RelayError::RequestRejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            RelayError::UpstreamFailure { body, .. } => body,
            RelayError::Provider(message) => json!({
                "error": "internal_server_error",
                "message": message,
            }),
            other => {
                let message = other.to_string();
                let message = if message.trim().is_empty() {
                    GENERIC_ERROR_MESSAGE.to_string()
                } else {
                    message
                };
                json!({ "error": message })
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type RelayResult<T> = Result<T, RelayError>;

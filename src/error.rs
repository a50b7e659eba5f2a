//! Error types
//!
//! Subscriber transport failures are local and never surface here; see
//! [`crate::transport::TransportError`].

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Result type alias using the crate error
pub type Result<T> = std::result::Result<T, Error>;

/// Crate error type
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O failure (binding, accepting)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Message encoding failure
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// HTTP client failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay answered with a non-success status
    #[error("request rejected with status {status}: {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Request failed");

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

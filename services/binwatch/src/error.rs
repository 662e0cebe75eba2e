//! Error types for the binwatch service

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::envelope::Envelope;

/// Errors that can occur while starting or running the service
#[derive(Debug, thiserror::Error)]
pub enum BinwatchError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Result type alias for binwatch operations
pub type Result<T> = std::result::Result<T, BinwatchError>;

/// Errors raised while handling a single API request.
///
/// All of them are turned into a `{success: false, message}` envelope at the
/// dispatch boundary; [`ApiError::status`] only picks the HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No store session could be obtained
    #[error("Database connection error.")]
    Connection(#[source] sqlx::Error),

    /// Unknown action, wrong request method or unreadable body
    #[error("{0}")]
    BadRequest(String),

    /// Missing, malformed or not allow-listed input
    #[error("{0}")]
    Validation(String),

    /// Entity absent or in the wrong state
    #[error("{0}")]
    NotFound(String),

    /// A store operation failed; `context` is what the client sees
    #[error("{context}.")]
    Store {
        context: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The handler panicked
    #[error("Internal server error.")]
    Internal,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::NotFound(_) => StatusCode::OK,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Connection(_) | ApiError::Store { .. } | ApiError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Connection(source) => {
                tracing::error!("Database connection failed: {}", source);
            }
            ApiError::Store { context, source } => {
                tracing::error!("{}: {}", context, source);
            }
            other => tracing::debug!("Request rejected: {}", other),
        }
        (self.status(), Json(Envelope::failure(self.to_string()))).into_response()
    }
}

/// Attaches a client-facing context to a failed store operation
pub trait StoreContext<T> {
    fn store_context(self, context: &'static str) -> std::result::Result<T, ApiError>;
}

impl<T> StoreContext<T> for std::result::Result<T, sqlx::Error> {
    fn store_context(self, context: &'static str) -> std::result::Result<T, ApiError> {
        self.map_err(|source| ApiError::Store { context, source })
    }
}

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::response::envelope_body;

/// Failure of a single bounded store call.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested row or key does not exist.
    #[error("record not found")]
    NotFound,

    /// The write collided with an existing primary key.
    #[error("record already exists")]
    Conflict,

    /// The call did not finish within its deadline and was abandoned.
    #[error("store call exceeded {0:?}")]
    Timeout(Duration),

    /// A row came back in a shape the model cannot represent.
    #[error("invalid row: {0}")]
    InvalidRow(String),

    /// Connectivity loss or any other backend failure.
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<tokio_postgres::Error> for StoreError {
    fn from(e: tokio_postgres::Error) -> Self {
        if e.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION) {
            return StoreError::Conflict;
        }
        StoreError::Backend(e.to_string())
    }
}

impl From<deadpool_postgres::PoolError> for StoreError {
    fn from(e: deadpool_postgres::PoolError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(e: redis::RedisError) -> Self {
        StoreError::Backend(e.to_string())
    }
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The supplied credential did not match.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The caller's role is not in the route's allowed set.
    #[error("Authorization failed")]
    Forbidden,

    /// A session, user or other resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A persistence failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// The status code and client-facing message for this error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "No access".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Store(StoreError::NotFound) => {
                (StatusCode::NOT_FOUND, "Resource not found".to_string())
            }
            AppError::Store(StoreError::Conflict) => {
                (StatusCode::CONFLICT, "Already exists".to_string())
            }
            AppError::Store(StoreError::Timeout(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Store timeout".to_string())
            }
            AppError::Store(StoreError::InvalidRow(_) | StoreError::Backend(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Store error".to_string())
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(ref msg) => tracing::debug!("Validation error: {}", msg),
            AppError::Authentication(ref msg) => tracing::warn!("Authentication failed: {}", msg),
            AppError::Forbidden => tracing::warn!("Authorization failed"),
            AppError::NotFound(ref msg) => tracing::debug!("Not found: {}", msg),
            AppError::Conflict(ref msg) => tracing::debug!("Conflict: {}", msg),
            AppError::Store(ref e) => tracing::error!("Store error: {}", e),
            AppError::Internal(ref msg) => tracing::error!("Internal error: {}", msg),
        }

        let (status, message) = self.status_and_message();
        let body = envelope_body(&(), &message);

        (status, [(http::header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}

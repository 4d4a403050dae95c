use std::io;

use serde::{Deserialize, Serialize};
pub use thiserror::Error;
use tokio::task::JoinError;

/// Application-level error taxonomy.
///
/// Every failure surfaced to a caller maps onto one of these variants; the
/// HTTP layer turns the variant into a status code and the message into a
/// structured JSON body. Nothing is retried automatically.
#[derive(Debug, Serialize, Deserialize, Error, Clone, PartialEq)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Authentication(String),
    #[error("{0}")]
    Authorization(String),
    #[error("{0}")]
    Upstream(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("An internal error occurred: {0}")]
    Internal(String),
}

impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::Validation(error.to_string())
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(format!("JSON serialization error: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for AppError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        AppError::Upstream("operation timed out".into())
    }
}

impl From<JoinError> for AppError {
    fn from(err: JoinError) -> Self {
        AppError::Internal(format!("Task failed to join: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(_: jsonwebtoken::errors::Error) -> Self {
        AppError::Authentication("Not authorized, token failed".into())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Password hashing failed: {}", err))
    }
}

impl AppError {
    /// Variant name used by logs and by the HTTP status mapping.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Authentication(_) => "authentication",
            AppError::Authorization(_) => "authorization",
            AppError::Upstream(_) => "upstream",
            AppError::Storage(_) => "storage",
            AppError::Internal(_) => "internal",
        }
    }
}

/// A type alias for a `Result` that returns an `AppError` on failure.
pub type AppResult<T> = Result<T, AppError>;

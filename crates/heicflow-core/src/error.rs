//! Error types module
//!
//! `AppError` covers failures of the collaborators the pipeline talks to that
//! have no dedicated error type of their own (the document store, configuration).
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether retrying the same operation may succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            #[cfg(feature = "sqlx")]
            AppError::Database(e) => matches!(
                e,
                SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_)
            ),
            #[cfg(not(feature = "sqlx"))]
            AppError::Database(_) => true,
            AppError::NotFound(_) => true,
            AppError::InvalidInput(_) | AppError::Config(_) => false,
            AppError::Internal(_) => false,
        }
    }
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => AppError::NotFound("row not found".to_string()),
            other => AppError::Database(other),
        }
    }
}

//! Error types for the client.

use thiserror::Error;

/// Errors from the Local Store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::ConstraintViolation(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

/// Errors from a Remote Store. Never fatal to a local action.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    /// Transport failure, timeout, or unreachable remote
    #[error("network error: {0}")]
    Network(String),

    /// The remote refused the request
    #[error("rejected by remote: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_status() || err.is_decode() {
            RemoteError::Rejected(err.to_string())
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for RemoteError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        RemoteError::Network(err.to_string())
    }
}

impl From<tasksync_engine::Error> for RemoteError {
    fn from(err: tasksync_engine::Error) -> Self {
        RemoteError::Rejected(err.to_string())
    }
}

/// Errors from user-facing actions.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Invalid(#[from] tasksync_engine::Error),
}

/// Result type for Local Store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for Remote Store operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Result type for service actions.
pub type Result<T> = std::result::Result<T, ServiceError>;

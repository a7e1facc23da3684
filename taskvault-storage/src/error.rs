//! Storage error types.

use thiserror::Error;
use uuid::Uuid;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("task {0} not found")]
    TaskNotFound(Uuid),

    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("email already registered: {0}")]
    EmailInUse(String),

    #[error("invalid stored row: {0}")]
    InvalidRow(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] taskvault_crypto::CryptoError),
}

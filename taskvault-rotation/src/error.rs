//! Rotation and account error types.

use thiserror::Error;
use uuid::Uuid;

/// Result type for rotation and account operations.
pub type RotationResult<T> = Result<T, RotationError>;

/// Errors from the rotation coordinator and account operations.
#[derive(Debug, Error)]
pub enum RotationError {
    #[error("storage error: {0}")]
    Storage(#[from] taskvault_storage::StorageError),

    #[error("crypto error: {0}")]
    Crypto(#[from] taskvault_crypto::CryptoError),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password too short (min 8 characters)")]
    PasswordTooShort,

    #[error("user {0} not found")]
    UserNotFound(Uuid),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("rotation coordinator not running")]
    NotRunning,
}

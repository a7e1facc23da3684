//! Field encryption error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur while encrypting or decrypting task fields.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("no master key configured for generation {0}")]
    UnknownGeneration(u32),

    #[error("decryption failed (wrong key or tampered data)")]
    AuthenticationFailure,

    #[error("stored data is not valid encrypted content")]
    CorruptFraming,

    #[error("decrypted payload is not a valid {expected}: {detail}")]
    TypeMismatch {
        expected: &'static str,
        detail: String,
    },

    #[error("value collides with the reserved null sentinel")]
    SentinelCollision,

    #[error("master key too short: {actual} bytes, need at least {minimum}")]
    MasterKeyTooShort { minimum: usize, actual: usize },

    #[error("master key for generation {generation} is not valid base64: {detail}")]
    InvalidMasterKey { generation: u32, detail: String },

    #[error("invalid salt length: expected {expected} bytes, got {actual}")]
    InvalidSaltLength { expected: usize, actual: usize },

    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

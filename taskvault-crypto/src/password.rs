//! Account password hashing.
//!
//! Argon2id via the PHC string format. Unrelated to field encryption: the
//! password hash authenticates logins, while field keys come from the
//! master key registry. They meet only during a password change, when the
//! account's salt rotation rewrites both.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use crate::error::{CryptoError, CryptoResult};

/// Hashes a password with Argon2id, returning a PHC-format string.
pub fn hash_password(password: &str) -> CryptoResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CryptoError::PasswordHash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash string.
///
/// Malformed hashes verify as false rather than erroring.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

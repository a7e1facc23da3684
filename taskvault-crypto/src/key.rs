//! Key material types with zeroization.

use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CryptoError, CryptoResult};

/// Size of a derived field key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of a per-user salt in bytes.
pub const SALT_SIZE: usize = 16;

/// Minimum accepted master key size in bytes.
pub const MIN_MASTER_KEY_SIZE: usize = 32;

/// Master key generation number.
///
/// Each generation names one configured master key. Stored ciphertexts
/// carry the generation they were encrypted under.
pub type KeyGeneration = u32;

/// A configured master secret for one key generation.
///
/// Never used to encrypt directly; field keys are derived from it per user.
/// Zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    bytes: Vec<u8>,
}

impl MasterKey {
    /// Wraps raw master key bytes, rejecting keys below the minimum size.
    pub fn new(bytes: Vec<u8>) -> CryptoResult<Self> {
        if bytes.len() < MIN_MASTER_KEY_SIZE {
            return Err(CryptoError::MasterKeyTooShort {
                minimum: MIN_MASTER_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// A 256-bit field encryption key derived for one (user, salt, generation).
///
/// Exists only for the duration of a call; zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    bytes: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

/// Per-user key derivation salt.
///
/// Generated at account creation and replaced (with full re-encryption of
/// the user's data) on password change. Not a secret.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Salt {
    bytes: [u8; SALT_SIZE],
}

impl Salt {
    /// Generates a fresh random salt from the OS CSPRNG.
    pub fn random() -> Self {
        let mut bytes = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    pub fn from_bytes(bytes: [u8; SALT_SIZE]) -> Self {
        Self { bytes }
    }

    /// Reconstructs a salt from a stored byte slice.
    pub fn from_slice(bytes: &[u8]) -> CryptoResult<Self> {
        if bytes.len() != SALT_SIZE {
            return Err(CryptoError::InvalidSaltLength {
                expected: SALT_SIZE,
                actual: bytes.len(),
            });
        }
        let mut fixed = [0u8; SALT_SIZE];
        fixed.copy_from_slice(bytes);
        Ok(Self { bytes: fixed })
    }

    pub fn as_bytes(&self) -> &[u8; SALT_SIZE] {
        &self.bytes
    }
}

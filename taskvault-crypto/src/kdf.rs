//! Per-user field key derivation.
//!
//! Field keys are derived with HMAC-SHA256 keyed by a generation's master
//! key, over the owning user's id followed by the user's salt. Derivation is
//! deterministic and cheap, so derived keys are computed per call and never
//! stored.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::error::{CryptoError, CryptoResult};
use crate::key::{DerivedKey, MasterKey, Salt};

/// Derives the field encryption key for one user under one master key.
///
/// The MAC input is the hyphenated lowercase user id text followed by the
/// raw salt bytes. That order is part of the stored data format and must
/// never change.
pub fn derive_field_key(
    master: &MasterKey,
    user_id: Uuid,
    salt: &Salt,
) -> CryptoResult<DerivedKey> {
    let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(master.as_bytes())
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    mac.update(user_id.to_string().as_bytes());
    mac.update(salt.as_bytes());

    let digest = mac.finalize().into_bytes();
    Ok(DerivedKey::from_bytes(digest.into()))
}

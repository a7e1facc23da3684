//! Versioned master key registry.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{CryptoError, CryptoResult};
use crate::key::{KeyGeneration, MasterKey};

/// Keyring configuration as loaded from the deployment environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyringConfig {
    /// Generation used to encrypt all new data.
    pub active_generation: KeyGeneration,
    /// Base64-encoded master keys by generation, 32 bytes minimum each.
    /// Older generations stay configured until every stored field has been
    /// rotated past them.
    pub keys: HashMap<KeyGeneration, String>,
}

/// Immutable registry of master keys by generation.
///
/// Built once at startup and shared read-only for the process lifetime.
pub struct Keyring {
    active: KeyGeneration,
    keys: HashMap<KeyGeneration, MasterKey>,
}

impl Keyring {
    /// Builds a keyring from configuration.
    ///
    /// Fails when a configured key is not valid base64, decodes to fewer
    /// than 32 bytes, or the active generation has no key at all.
    pub fn from_config(config: &KeyringConfig) -> CryptoResult<Self> {
        let mut keys = HashMap::with_capacity(config.keys.len());
        for (&generation, encoded) in &config.keys {
            let raw = STANDARD
                .decode(encoded)
                .map_err(|e| CryptoError::InvalidMasterKey {
                    generation,
                    detail: e.to_string(),
                })?;
            keys.insert(generation, MasterKey::new(raw)?);
        }

        if !keys.contains_key(&config.active_generation) {
            return Err(CryptoError::UnknownGeneration(config.active_generation));
        }

        Ok(Self {
            active: config.active_generation,
            keys,
        })
    }

    /// Generation used for all new writes.
    pub fn active_generation(&self) -> KeyGeneration {
        self.active
    }

    /// Looks up the master key for a generation.
    ///
    /// An unknown generation means stored data references a key the
    /// deployment no longer carries, which is a fatal configuration error
    /// rather than a data error.
    pub fn master_key(&self, generation: KeyGeneration) -> CryptoResult<&MasterKey> {
        self.keys
            .get(&generation)
            .ok_or(CryptoError::UnknownGeneration(generation))
    }
}

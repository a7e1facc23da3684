//! Field encryption layer for TaskVault.
//!
//! Per-user envelope encryption for task data at rest:
//! - HMAC-SHA256 key derivation per (master key, user, salt)
//! - ChaCha20-Poly1305 authenticated encryption with base64 framing
//! - Versioned master keys (generations) for online key rotation
//! - Argon2id for account password hashing
//!
//! # Architecture
//!
//! Every sensitive task field is encrypted separately under a key derived
//! from three inputs:
//!
//! 1. **Master key**: one secret per key generation, configured at
//!    deployment. The generation active at write time is stored next to the
//!    ciphertext so decryption can select the matching key later, which is
//!    what lets rotation proceed without downtime.
//!
//! 2. **User id and salt**: bind each ciphertext to its owning account.
//!    The salt is regenerated on password change, forcing re-encryption of
//!    everything the user owns.
//!
//! Derivation is deterministic, so derived keys are never stored anywhere;
//! losing a configured master key is the only way to lose data.

mod cipher;
mod error;
mod fields;
mod kdf;
mod key;
mod keyring;
mod password;
mod service;

pub use cipher::{decrypt, encrypt, Envelope, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, CryptoResult};
pub use fields::{
    decode_bool, decode_int, decode_opt_text, decode_opt_timestamp, decode_text, encode_bool,
    encode_int, encode_opt_text, encode_opt_timestamp, encode_text, NULL_SENTINEL,
};
pub use kdf::derive_field_key;
pub use key::{
    DerivedKey, KeyGeneration, MasterKey, Salt, KEY_SIZE, MIN_MASTER_KEY_SIZE, SALT_SIZE,
};
pub use keyring::{Keyring, KeyringConfig};
pub use password::{hash_password, verify_password};
pub use service::{EncryptedValue, EncryptionService};

//! Typed field encryption service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cipher::{decrypt, encrypt, Envelope};
use crate::error::CryptoResult;
use crate::fields;
use crate::kdf::derive_field_key;
use crate::key::{KeyGeneration, Salt};
use crate::keyring::Keyring;

/// Ciphertext plus the key generation it was produced under.
///
/// The two travel together: decryption needs the generation to select the
/// master key, so persisting one without the other orphans the data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedValue {
    pub ciphertext: String,
    pub generation: KeyGeneration,
}

/// Encrypts and decrypts typed task fields for individual users.
///
/// Encryption always binds the keyring's active generation; decryption uses
/// whatever generation the stored value carries. The service holds no state
/// beyond the shared keyring and is safe to use from any thread.
#[derive(Clone)]
pub struct EncryptionService {
    keyring: Arc<Keyring>,
}

impl EncryptionService {
    pub fn new(keyring: Arc<Keyring>) -> Self {
        Self { keyring }
    }

    /// Generation new writes are encrypted under.
    pub fn active_generation(&self) -> KeyGeneration {
        self.keyring.active_generation()
    }

    fn seal(&self, plaintext: &[u8], user_id: Uuid, salt: &Salt) -> CryptoResult<EncryptedValue> {
        let generation = self.keyring.active_generation();
        let master = self.keyring.master_key(generation)?;
        let key = derive_field_key(master, user_id, salt)?;
        let envelope = encrypt(&key, plaintext)?;
        Ok(EncryptedValue {
            ciphertext: envelope.encode(),
            generation,
        })
    }

    fn open(
        &self,
        ciphertext: &str,
        user_id: Uuid,
        generation: KeyGeneration,
        salt: &Salt,
    ) -> CryptoResult<Vec<u8>> {
        let master = self.keyring.master_key(generation)?;
        let key = derive_field_key(master, user_id, salt)?;
        let envelope = Envelope::decode(ciphertext)?;
        decrypt(&key, &envelope)
    }

    // ── Required text ────────────────────────────────────────────────────

    pub fn encrypt_text(
        &self,
        value: &str,
        user_id: Uuid,
        salt: &Salt,
    ) -> CryptoResult<EncryptedValue> {
        self.seal(fields::encode_text(value).as_bytes(), user_id, salt)
    }

    pub fn decrypt_text(
        &self,
        ciphertext: &str,
        user_id: Uuid,
        generation: KeyGeneration,
        salt: &Salt,
    ) -> CryptoResult<String> {
        let plaintext = self.open(ciphertext, user_id, generation, salt)?;
        fields::decode_text(&plaintext)
    }

    // ── Optional text ────────────────────────────────────────────────────

    pub fn encrypt_opt_text(
        &self,
        value: Option<&str>,
        user_id: Uuid,
        salt: &Salt,
    ) -> CryptoResult<EncryptedValue> {
        self.seal(fields::encode_opt_text(value)?.as_bytes(), user_id, salt)
    }

    pub fn decrypt_opt_text(
        &self,
        ciphertext: &str,
        user_id: Uuid,
        generation: KeyGeneration,
        salt: &Salt,
    ) -> CryptoResult<Option<String>> {
        let plaintext = self.open(ciphertext, user_id, generation, salt)?;
        fields::decode_opt_text(&plaintext)
    }

    // ── Integer ──────────────────────────────────────────────────────────

    pub fn encrypt_int(
        &self,
        value: i64,
        user_id: Uuid,
        salt: &Salt,
    ) -> CryptoResult<EncryptedValue> {
        self.seal(fields::encode_int(value).as_bytes(), user_id, salt)
    }

    pub fn decrypt_int(
        &self,
        ciphertext: &str,
        user_id: Uuid,
        generation: KeyGeneration,
        salt: &Salt,
    ) -> CryptoResult<i64> {
        let plaintext = self.open(ciphertext, user_id, generation, salt)?;
        fields::decode_int(&plaintext)
    }

    // ── Boolean ──────────────────────────────────────────────────────────

    pub fn encrypt_bool(
        &self,
        value: bool,
        user_id: Uuid,
        salt: &Salt,
    ) -> CryptoResult<EncryptedValue> {
        self.seal(fields::encode_bool(value).as_bytes(), user_id, salt)
    }

    pub fn decrypt_bool(
        &self,
        ciphertext: &str,
        user_id: Uuid,
        generation: KeyGeneration,
        salt: &Salt,
    ) -> CryptoResult<bool> {
        let plaintext = self.open(ciphertext, user_id, generation, salt)?;
        fields::decode_bool(&plaintext)
    }

    // ── Optional timestamp ───────────────────────────────────────────────

    pub fn encrypt_opt_timestamp(
        &self,
        value: Option<DateTime<Utc>>,
        user_id: Uuid,
        salt: &Salt,
    ) -> CryptoResult<EncryptedValue> {
        self.seal(
            fields::encode_opt_timestamp(value).as_bytes(),
            user_id,
            salt,
        )
    }

    pub fn decrypt_opt_timestamp(
        &self,
        ciphertext: &str,
        user_id: Uuid,
        generation: KeyGeneration,
        salt: &Salt,
    ) -> CryptoResult<Option<DateTime<Utc>>> {
        let plaintext = self.open(ciphertext, user_id, generation, salt)?;
        fields::decode_opt_timestamp(&plaintext)
    }

    // ── Rotation ─────────────────────────────────────────────────────────

    /// Re-encrypts one stored value to the active generation.
    ///
    /// Decrypts with the stored generation and `decrypt_salt`, then seals
    /// the raw plaintext under the active generation and `encrypt_salt`.
    /// The plaintext bytes are never interpreted, so a single helper serves
    /// every field type. Pass the same salt twice for key rotation; pass
    /// old and new salts for a salt rotation.
    pub fn reencrypt(
        &self,
        ciphertext: &str,
        user_id: Uuid,
        generation: KeyGeneration,
        decrypt_salt: &Salt,
        encrypt_salt: &Salt,
    ) -> CryptoResult<EncryptedValue> {
        let plaintext = self.open(ciphertext, user_id, generation, decrypt_salt)?;
        self.seal(&plaintext, user_id, encrypt_salt)
    }
}

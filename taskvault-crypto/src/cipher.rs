//! Authenticated field encryption.
//!
//! Every encrypted field is a ChaCha20-Poly1305 envelope stored as
//! `base64(nonce || tag || ciphertext)`. The nonce is drawn fresh from the
//! OS CSPRNG on every call; the Poly1305 tag covers the whole ciphertext, so
//! any modification of the stored string fails decryption outright instead
//! of producing garbled plaintext.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;

use crate::error::{CryptoError, CryptoResult};
use crate::key::DerivedKey;

/// ChaCha20-Poly1305 nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// Poly1305 authentication tag size in bytes (128 bits).
pub const TAG_SIZE: usize = 16;

/// One encrypted field payload: nonce, authentication tag, ciphertext.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    pub nonce: [u8; NONCE_SIZE],
    pub tag: [u8; TAG_SIZE],
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Serializes the envelope as base64 over `nonce || tag || ciphertext`.
    pub fn encode(&self) -> String {
        let mut raw = Vec::with_capacity(NONCE_SIZE + TAG_SIZE + self.ciphertext.len());
        raw.extend_from_slice(&self.nonce);
        raw.extend_from_slice(&self.tag);
        raw.extend_from_slice(&self.ciphertext);
        STANDARD.encode(raw)
    }

    /// Parses a stored base64 envelope.
    ///
    /// Fails with [`CryptoError::CorruptFraming`] when the input is not
    /// valid base64 or is shorter than a nonce plus a tag.
    pub fn decode(encoded: &str) -> CryptoResult<Self> {
        let raw = STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::CorruptFraming)?;
        if raw.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::CorruptFraming);
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&raw[..NONCE_SIZE]);
        let mut tag = [0u8; TAG_SIZE];
        tag.copy_from_slice(&raw[NONCE_SIZE..NONCE_SIZE + TAG_SIZE]);

        Ok(Self {
            nonce,
            tag,
            ciphertext: raw[NONCE_SIZE + TAG_SIZE..].to_vec(),
        })
    }
}

/// Encrypts `plaintext` under `key` with a fresh random nonce.
///
/// Empty plaintext is valid and produces a tag-only envelope.
pub fn encrypt(key: &DerivedKey, plaintext: &[u8]) -> CryptoResult<Envelope> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| CryptoError::Encryption(format!("field encryption failed: {e}")))?;

    // The AEAD output is ciphertext with the tag appended; the stored
    // layout carries the tag next to the nonce instead.
    let split = sealed.len() - TAG_SIZE;
    let mut tag = [0u8; TAG_SIZE];
    tag.copy_from_slice(&sealed[split..]);

    Ok(Envelope {
        nonce: nonce_bytes,
        tag,
        ciphertext: sealed[..split].to_vec(),
    })
}

/// Decrypts an envelope, authenticating it first.
///
/// Wrong key, wrong user, wrong salt, and modified data are all reported as
/// [`CryptoError::AuthenticationFailure`]; no plaintext is released on
/// failure.
pub fn decrypt(key: &DerivedKey, envelope: &Envelope) -> CryptoResult<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut sealed = Vec::with_capacity(envelope.ciphertext.len() + TAG_SIZE);
    sealed.extend_from_slice(&envelope.ciphertext);
    sealed.extend_from_slice(&envelope.tag);

    cipher
        .decrypt(Nonce::from_slice(&envelope.nonce), sealed.as_ref())
        .map_err(|_| CryptoError::AuthenticationFailure)
}

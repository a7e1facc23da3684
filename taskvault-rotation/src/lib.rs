//! Background key rotation and account lifecycle for TaskVault.
//!
//! # Architecture
//!
//! - `coordinator` runs the long-lived rotation loop: scan for task rows
//!   encrypted under an old key generation, re-encrypt them in bounded
//!   batches, repeat. Callers talk to it through a [`RotationHandle`].
//! - `account` covers registration, login, and password change. A password
//!   change re-encrypts the user's data under a fresh salt and commits it
//!   atomically with the new credentials.
//! - `rekey` is the shared piece: rewriting one task row's ciphertexts
//!   under the active generation.
//!
//! Rotation is opportunistic. A record that fails to re-encrypt is logged
//! and skipped, never blocking the rest of the batch, and reads keep
//! working throughout because historical generations stay in the keyring.

mod account;
mod config;
mod coordinator;
mod error;
mod rekey;

pub use account::{authenticate, change_password, create_account, MIN_PASSWORD_LENGTH};
pub use config::RotationConfig;
pub use coordinator::{
    create_rotation_coordinator, CycleOutcome, RotationCommand, RotationCoordinator,
    RotationHandle,
};
pub use error::{RotationError, RotationResult};
pub use rekey::reencrypt_task;

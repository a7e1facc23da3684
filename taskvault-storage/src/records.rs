//! Record types stored and returned by the task store.

use chrono::{DateTime, Utc};
use taskvault_crypto::{KeyGeneration, Salt};
use uuid::Uuid;

/// A registered account row.
#[derive(Clone, Debug)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    /// Argon2id PHC hash string.
    pub password_hash: String,
    /// Key derivation salt. Replaced, together with a rewrite of all the
    /// user's ciphertexts, on password change.
    pub salt: Salt,
    pub created_at: i64,
}

/// The six encrypted columns of one task row.
///
/// Each value is an opaque base64 envelope; the store never interprets them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedTaskFields {
    pub title: String,
    pub notes: String,
    pub deadline: String,
    pub completed_at: String,
    pub pinned: String,
    pub priority: String,
}

/// One stored task row: ciphertexts plus the key generation they were
/// encrypted under.
///
/// Rows are always written whole, so a read never observes fields from one
/// generation paired with another's tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fields: EncryptedTaskFields,
    pub generation: KeyGeneration,
    pub created_at: i64,
}

/// Plaintext task values as the application sees them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskData {
    pub title: String,
    pub notes: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub pinned: bool,
    pub priority: i64,
}

/// A decrypted task returned to the application.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedTask {
    pub id: Uuid,
    pub data: TaskData,
    pub created_at: i64,
}

//! Account lifecycle: registration, login, password change.
//!
//! A password change doubles as salt rotation. Every ciphertext the user
//! owns is re-encrypted under a fresh salt and the active generation, and
//! the new salt, new password hash, and rewritten rows commit together.

use chrono::Utc;
use taskvault_crypto::{hash_password, verify_password, EncryptionService, Salt};
use taskvault_storage::{TaskStore, UserRecord};
use tracing::info;
use uuid::Uuid;

use crate::error::{RotationError, RotationResult};
use crate::rekey::reencrypt_task;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Registers a new account with a fresh salt, returning its id.
pub fn create_account(store: &TaskStore, email: &str, password: &str) -> RotationResult<Uuid> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(RotationError::PasswordTooShort);
    }

    let user = UserRecord {
        id: Uuid::new_v4(),
        email: email.to_string(),
        password_hash: hash_password(password)?,
        salt: Salt::random(),
        created_at: Utc::now().timestamp_millis(),
    };
    store.insert_user(&user)?;

    info!("created account {}", user.id);
    Ok(user.id)
}

/// Verifies login credentials, returning the account id.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub fn authenticate(store: &TaskStore, email: &str, password: &str) -> RotationResult<Uuid> {
    let Some(user) = store.user_by_email(email)? else {
        return Err(RotationError::InvalidCredentials);
    };
    if !verify_password(password, &user.password_hash) {
        return Err(RotationError::InvalidCredentials);
    }
    Ok(user.id)
}

/// Changes an account password, rotating its salt.
///
/// Re-encrypts every task field the user owns from the old salt to a fresh
/// one, then commits the new salt, new password hash, and rewritten rows in
/// a single transaction. Any failure leaves the account untouched, so the
/// old password keeps working.
pub fn change_password(
    store: &TaskStore,
    crypto: &EncryptionService,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> RotationResult<()> {
    let Some(user) = store.user(user_id)? else {
        return Err(RotationError::UserNotFound(user_id));
    };
    if !verify_password(current_password, &user.password_hash) {
        return Err(RotationError::InvalidCredentials);
    }
    if new_password.len() < MIN_PASSWORD_LENGTH {
        return Err(RotationError::PasswordTooShort);
    }

    let new_salt = Salt::random();
    let records = store.tasks_for_user(user_id)?;

    let mut rewritten = Vec::with_capacity(records.len());
    for record in &records {
        rewritten.push(reencrypt_task(crypto, record, &user.salt, &new_salt)?);
    }

    let new_hash = hash_password(new_password)?;
    store.commit_salt_rotation(user_id, &new_salt, &new_hash, &rewritten)?;

    info!("rotated salt for user {user_id} ({} tasks re-encrypted)", rewritten.len());
    Ok(())
}

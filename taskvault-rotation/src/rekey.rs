//! Whole-record re-encryption.

use taskvault_crypto::{CryptoResult, EncryptionService, Salt};
use taskvault_storage::{EncryptedTaskFields, TaskRecord};

/// Re-encrypts every field of one task row under the active generation.
///
/// `decrypt_salt` unlocks the stored ciphertexts and `encrypt_salt` keys the
/// rewritten ones. Key rotation passes the same salt twice; a password change
/// passes the old and the new salt. The input record is left untouched and
/// nothing is persisted here.
pub fn reencrypt_task(
    crypto: &EncryptionService,
    record: &TaskRecord,
    decrypt_salt: &Salt,
    encrypt_salt: &Salt,
) -> CryptoResult<TaskRecord> {
    let user = record.user_id;
    let generation = record.generation;
    let fields = &record.fields;

    let title = crypto.reencrypt(&fields.title, user, generation, decrypt_salt, encrypt_salt)?;
    let notes = crypto.reencrypt(&fields.notes, user, generation, decrypt_salt, encrypt_salt)?;
    let deadline = crypto.reencrypt(&fields.deadline, user, generation, decrypt_salt, encrypt_salt)?;
    let completed_at =
        crypto.reencrypt(&fields.completed_at, user, generation, decrypt_salt, encrypt_salt)?;
    let pinned = crypto.reencrypt(&fields.pinned, user, generation, decrypt_salt, encrypt_salt)?;
    let priority =
        crypto.reencrypt(&fields.priority, user, generation, decrypt_salt, encrypt_salt)?;

    Ok(TaskRecord {
        id: record.id,
        user_id: user,
        fields: EncryptedTaskFields {
            title: title.ciphertext,
            notes: notes.ciphertext,
            deadline: deadline.ciphertext,
            completed_at: completed_at.ciphertext,
            pinned: pinned.ciphertext,
            priority: priority.ciphertext,
        },
        generation: title.generation,
        created_at: record.created_at,
    })
}

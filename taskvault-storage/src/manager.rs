//! Typed task layer: encrypts on write, decrypts on read.

use chrono::Utc;
use taskvault_crypto::{EncryptionService, Salt};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::records::{DecryptedTask, EncryptedTaskFields, TaskData, TaskRecord};
use crate::task_store::TaskStore;

/// Application-facing task operations over encrypted rows.
///
/// Writes encrypt all six fields under the active generation and the
/// owner's current salt; reads decrypt with each record's own stored
/// generation. Decrypt failures propagate to the caller, they are never
/// masked as a missing task.
#[derive(Clone)]
pub struct TaskManager {
    store: TaskStore,
    crypto: EncryptionService,
}

impl TaskManager {
    pub fn new(store: TaskStore, crypto: EncryptionService) -> Self {
        Self { store, crypto }
    }

    /// Encrypts and stores a new task, returning its id.
    pub fn create_task(&self, user_id: Uuid, data: &TaskData) -> StorageResult<Uuid> {
        let salt = self.require_salt(user_id)?;
        let record = TaskRecord {
            id: Uuid::new_v4(),
            user_id,
            fields: self.encrypt_fields(user_id, &salt, data)?,
            generation: self.crypto.active_generation(),
            created_at: Utc::now().timestamp_millis(),
        };
        self.store.insert_task(&record)?;
        Ok(record.id)
    }

    /// Fetches and decrypts one task, scoped to its owner.
    pub fn get_task(&self, user_id: Uuid, task_id: Uuid) -> StorageResult<Option<DecryptedTask>> {
        let Some(record) = self.store.task(user_id, task_id)? else {
            return Ok(None);
        };
        let salt = self.require_salt(user_id)?;
        Ok(Some(self.decrypt_record(&record, &salt)?))
    }

    /// Fetches and decrypts all of a user's tasks, newest first.
    pub fn list_tasks(&self, user_id: Uuid) -> StorageResult<Vec<DecryptedTask>> {
        let salt = self.require_salt(user_id)?;
        let records = self.store.tasks_for_user(user_id)?;

        let mut tasks = Vec::with_capacity(records.len());
        for record in &records {
            tasks.push(self.decrypt_record(record, &salt)?);
        }
        Ok(tasks)
    }

    /// Replaces a task's values, re-encrypting every field under the active
    /// generation.
    pub fn update_task(&self, user_id: Uuid, task_id: Uuid, data: &TaskData) -> StorageResult<()> {
        let Some(existing) = self.store.task(user_id, task_id)? else {
            return Err(StorageError::TaskNotFound(task_id));
        };
        let salt = self.require_salt(user_id)?;

        let record = TaskRecord {
            id: existing.id,
            user_id,
            fields: self.encrypt_fields(user_id, &salt, data)?,
            generation: self.crypto.active_generation(),
            created_at: existing.created_at,
        };
        self.store.insert_task(&record)
    }

    /// Deletes a task, scoped to its owner.
    pub fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> StorageResult<()> {
        self.store.delete_task(user_id, task_id)
    }

    fn require_salt(&self, user_id: Uuid) -> StorageResult<Salt> {
        self.store
            .user_salt(user_id)?
            .ok_or(StorageError::UserNotFound(user_id))
    }

    fn encrypt_fields(
        &self,
        user_id: Uuid,
        salt: &Salt,
        data: &TaskData,
    ) -> StorageResult<EncryptedTaskFields> {
        Ok(EncryptedTaskFields {
            title: self.crypto.encrypt_text(&data.title, user_id, salt)?.ciphertext,
            notes: self
                .crypto
                .encrypt_opt_text(data.notes.as_deref(), user_id, salt)?
                .ciphertext,
            deadline: self
                .crypto
                .encrypt_opt_timestamp(data.deadline, user_id, salt)?
                .ciphertext,
            completed_at: self
                .crypto
                .encrypt_opt_timestamp(data.completed_at, user_id, salt)?
                .ciphertext,
            pinned: self.crypto.encrypt_bool(data.pinned, user_id, salt)?.ciphertext,
            priority: self.crypto.encrypt_int(data.priority, user_id, salt)?.ciphertext,
        })
    }

    fn decrypt_record(&self, record: &TaskRecord, salt: &Salt) -> StorageResult<DecryptedTask> {
        let user = record.user_id;
        let generation = record.generation;
        let fields = &record.fields;

        Ok(DecryptedTask {
            id: record.id,
            data: TaskData {
                title: self.crypto.decrypt_text(&fields.title, user, generation, salt)?,
                notes: self
                    .crypto
                    .decrypt_opt_text(&fields.notes, user, generation, salt)?,
                deadline: self
                    .crypto
                    .decrypt_opt_timestamp(&fields.deadline, user, generation, salt)?,
                completed_at: self
                    .crypto
                    .decrypt_opt_timestamp(&fields.completed_at, user, generation, salt)?,
                pinned: self.crypto.decrypt_bool(&fields.pinned, user, generation, salt)?,
                priority: self.crypto.decrypt_int(&fields.priority, user, generation, salt)?,
            },
            created_at: record.created_at,
        })
    }
}

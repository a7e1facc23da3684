//! Task and user store backed by DuckDB.
//!
//! Ciphertext columns are stored verbatim as TEXT; the store's only crypto
//! knowledge is the `key_generation` column it keeps next to them. The two
//! multi-row rewrites (rotation batches and salt rotation) run inside
//! explicit transactions so readers never observe a half-rewritten state.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use duckdb::{params, Connection};
use taskvault_crypto::{KeyGeneration, Salt};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};
use crate::records::{EncryptedTaskFields, TaskRecord, UserRecord};

/// Raw task row as read from DuckDB, before UUID parsing.
type RawTaskRow = (String, String, String, String, String, String, String, String, i64, i64);

const TASK_COLUMNS: &str = "id, user_id, title_enc, notes_enc, deadline_enc, \
     completed_at_enc, pinned_enc, priority_enc, key_generation, created_at";

/// Account and encrypted-task store backed by DuckDB.
#[derive(Clone)]
pub struct TaskStore {
    conn: Arc<Mutex<Connection>>,
}

impl TaskStore {
    /// Opens or creates a task store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = crate::open_duckdb_with_wal_recovery(path, "256MB", 2)?;
        initialize_task_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory task store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_task_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ── Users ────────────────────────────────────────────────────────────

    /// Inserts a new account row.
    ///
    /// Fails with [`StorageError::EmailInUse`] when the email is already
    /// registered. The check runs under the connection lock, so two inserts
    /// through the same store cannot race past it.
    pub fn insert_user(&self, user: &UserRecord) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();

        let taken: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE email = ?",
            params![user.email],
            |row| row.get(0),
        )?;
        if taken > 0 {
            return Err(StorageError::EmailInUse(user.email.clone()));
        }

        conn.execute(
            "INSERT INTO users (id, email, password_hash, salt, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                user.id.to_string(),
                user.email,
                user.password_hash,
                user.salt.as_bytes().to_vec(),
                user.created_at,
            ],
        )?;
        Ok(())
    }

    /// Fetches an account by id.
    pub fn user(&self, user_id: Uuid) -> StorageResult<Option<UserRecord>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, email, password_hash, salt, created_at FROM users WHERE id = ?",
            params![user_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        );

        match result {
            Ok(raw) => Ok(Some(user_from_row(raw)?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches an account by email (login lookup).
    pub fn user_by_email(&self, email: &str) -> StorageResult<Option<UserRecord>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT id, email, password_hash, salt, created_at FROM users WHERE email = ?",
            params![email],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Vec<u8>>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            },
        );

        match result {
            Ok(raw) => Ok(Some(user_from_row(raw)?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches just the current salt of one user.
    pub fn user_salt(&self, user_id: Uuid) -> StorageResult<Option<Salt>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            "SELECT salt FROM users WHERE id = ?",
            params![user_id.to_string()],
            |row| row.get::<_, Vec<u8>>(0),
        );

        match result {
            Ok(raw) => {
                let salt = Salt::from_slice(&raw)
                    .map_err(|e| StorageError::InvalidRow(format!("user {user_id} salt: {e}")))?;
                Ok(Some(salt))
            }
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetches the current salts of several users in one call.
    ///
    /// Users that do not exist are simply absent from the result; rotation
    /// treats their records as per-record failures.
    pub fn user_salts(&self, user_ids: &[Uuid]) -> StorageResult<HashMap<Uuid, Salt>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT salt FROM users WHERE id = ?")?;

        let mut salts = HashMap::new();
        for &user_id in user_ids {
            if salts.contains_key(&user_id) {
                continue;
            }
            let result = stmt.query_row(params![user_id.to_string()], |row| {
                row.get::<_, Vec<u8>>(0)
            });
            match result {
                Ok(raw) => {
                    let salt = Salt::from_slice(&raw).map_err(|e| {
                        StorageError::InvalidRow(format!("user {user_id} salt: {e}"))
                    })?;
                    salts.insert(user_id, salt);
                }
                Err(duckdb::Error::QueryReturnedNoRows) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(salts)
    }

    // ── Tasks ────────────────────────────────────────────────────────────

    /// Saves (upserts) a task row.
    pub fn insert_task(&self, record: &TaskRecord) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO tasks (
                id, user_id, title_enc, notes_enc, deadline_enc,
                completed_at_enc, pinned_enc, priority_enc, key_generation, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                record.id.to_string(),
                record.user_id.to_string(),
                record.fields.title,
                record.fields.notes,
                record.fields.deadline,
                record.fields.completed_at,
                record.fields.pinned,
                record.fields.priority,
                record.generation as i64,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    /// Fetches one task row, scoped to its owner.
    pub fn task(&self, user_id: Uuid, task_id: Uuid) -> StorageResult<Option<TaskRecord>> {
        let conn = self.conn.lock().unwrap();
        let result = conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ? AND user_id = ?"),
            params![task_id.to_string(), user_id.to_string()],
            map_raw_task,
        );

        match result {
            Ok(raw) => Ok(Some(task_from_row(raw)?)),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Lists all task rows of one user, newest first.
    pub fn tasks_for_user(&self, user_id: Uuid) -> StorageResult<Vec<TaskRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = ? ORDER BY created_at DESC, id"
        ))?;
        let rows: Vec<RawTaskRow> = stmt
            .query_map(params![user_id.to_string()], map_raw_task)?
            .filter_map(|r| r.ok())
            .collect();

        drop(stmt);
        drop(conn);

        rows.into_iter().map(task_from_row).collect()
    }

    /// Deletes a task row, scoped to its owner.
    pub fn delete_task(&self, user_id: Uuid, task_id: Uuid) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute(
            "DELETE FROM tasks WHERE id = ? AND user_id = ?",
            params![task_id.to_string(), user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(StorageError::TaskNotFound(task_id));
        }
        Ok(())
    }

    // ── Key rotation scan ────────────────────────────────────────────────

    /// Counts task rows still encrypted under a generation older than
    /// `active`.
    pub fn count_lagging(&self, active: KeyGeneration) -> StorageResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE key_generation < ?",
            params![active as i64],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Fetches up to `limit` task rows lagging behind `active`, oldest
    /// first.
    pub fn lagging_tasks(
        &self,
        active: KeyGeneration,
        limit: usize,
    ) -> StorageResult<Vec<TaskRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE key_generation < ? \
             ORDER BY created_at, id LIMIT {limit}"
        ))?;
        let rows: Vec<RawTaskRow> = stmt
            .query_map(params![active as i64], map_raw_task)?
            .filter_map(|r| r.ok())
            .collect();

        drop(stmt);
        drop(conn);

        rows.into_iter().map(task_from_row).collect()
    }

    // ── Transactional rewrites ───────────────────────────────────────────

    /// Rewrites the ciphertexts and generation of a batch of task rows in
    /// one transaction.
    ///
    /// Rows deleted since they were read are silently skipped; everything
    /// else commits together or not at all.
    pub fn rewrite_batch(&self, records: &[TaskRecord]) -> StorageResult<()> {
        if records.is_empty() {
            return Ok(());
        }

        let conn = self.conn.lock().unwrap();
        conn.execute_batch("BEGIN TRANSACTION;")?;

        let result = (|| -> StorageResult<()> {
            let mut stmt = conn.prepare(
                "UPDATE tasks SET title_enc = ?, notes_enc = ?, deadline_enc = ?, \
                 completed_at_enc = ?, pinned_enc = ?, priority_enc = ?, key_generation = ? \
                 WHERE id = ?",
            )?;
            for record in records {
                stmt.execute(params![
                    record.fields.title,
                    record.fields.notes,
                    record.fields.deadline,
                    record.fields.completed_at,
                    record.fields.pinned,
                    record.fields.priority,
                    record.generation as i64,
                    record.id.to_string(),
                ])?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK;");
                Err(e)
            }
        }
    }

    /// Commits a salt rotation: new salt, new password hash, and every
    /// rewritten task row of one user, atomically.
    pub fn commit_salt_rotation(
        &self,
        user_id: Uuid,
        salt: &Salt,
        password_hash: &str,
        records: &[TaskRecord],
    ) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch("BEGIN TRANSACTION;")?;

        let result = (|| -> StorageResult<()> {
            let changed = conn.execute(
                "UPDATE users SET salt = ?, password_hash = ? WHERE id = ?",
                params![salt.as_bytes().to_vec(), password_hash, user_id.to_string()],
            )?;
            if changed == 0 {
                return Err(StorageError::UserNotFound(user_id));
            }

            let mut stmt = conn.prepare(
                "UPDATE tasks SET title_enc = ?, notes_enc = ?, deadline_enc = ?, \
                 completed_at_enc = ?, pinned_enc = ?, priority_enc = ?, key_generation = ? \
                 WHERE id = ? AND user_id = ?",
            )?;
            for record in records {
                stmt.execute(params![
                    record.fields.title,
                    record.fields.notes,
                    record.fields.deadline,
                    record.fields.completed_at,
                    record.fields.pinned,
                    record.fields.priority,
                    record.generation as i64,
                    record.id.to_string(),
                    user_id.to_string(),
                ])?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute_batch("COMMIT;")?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK;");
                Err(e)
            }
        }
    }
}

// ── Row mapping ──────────────────────────────────────────────────────────

fn map_raw_task(row: &duckdb::Row<'_>) -> duckdb::Result<RawTaskRow> {
    Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
        row.get::<_, String>(4)?,
        row.get::<_, String>(5)?,
        row.get::<_, String>(6)?,
        row.get::<_, String>(7)?,
        row.get::<_, i64>(8)?,
        row.get::<_, i64>(9)?,
    ))
}

fn task_from_row(raw: RawTaskRow) -> StorageResult<TaskRecord> {
    let (id, user_id, title, notes, deadline, completed_at, pinned, priority, generation, created_at) =
        raw;

    let id = Uuid::parse_str(&id)
        .map_err(|e| StorageError::InvalidRow(format!("task id {id}: {e}")))?;
    let user_id = Uuid::parse_str(&user_id)
        .map_err(|e| StorageError::InvalidRow(format!("task {id} user id: {e}")))?;
    let generation = u32::try_from(generation)
        .map_err(|_| StorageError::InvalidRow(format!("task {id} generation {generation}")))?;

    Ok(TaskRecord {
        id,
        user_id,
        fields: EncryptedTaskFields {
            title,
            notes,
            deadline,
            completed_at,
            pinned,
            priority,
        },
        generation,
        created_at,
    })
}

fn user_from_row(raw: (String, String, String, Vec<u8>, i64)) -> StorageResult<UserRecord> {
    let (id, email, password_hash, salt, created_at) = raw;

    let id = Uuid::parse_str(&id)
        .map_err(|e| StorageError::InvalidRow(format!("user id {id}: {e}")))?;
    let salt = Salt::from_slice(&salt)
        .map_err(|e| StorageError::InvalidRow(format!("user {id} salt: {e}")))?;

    Ok(UserRecord {
        id,
        email,
        password_hash,
        salt,
        created_at,
    })
}

// ── Schema ───────────────────────────────────────────────────────────────

fn initialize_task_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id VARCHAR PRIMARY KEY,
            email VARCHAR NOT NULL,
            password_hash VARCHAR NOT NULL,
            salt BLOB NOT NULL,
            created_at BIGINT NOT NULL
        );
        CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email ON users(email);

        -- The *_enc columns hold opaque base64 envelopes; key_generation
        -- names the master key generation all six were encrypted under.
        CREATE TABLE IF NOT EXISTS tasks (
            id VARCHAR PRIMARY KEY,
            user_id VARCHAR NOT NULL,
            title_enc TEXT NOT NULL,
            notes_enc TEXT NOT NULL,
            deadline_enc TEXT NOT NULL,
            completed_at_enc TEXT NOT NULL,
            pinned_enc TEXT NOT NULL,
            priority_enc TEXT NOT NULL,
            key_generation BIGINT NOT NULL,
            created_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_tasks_user ON tasks(user_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_generation ON tasks(key_generation, created_at);
        "#,
    )?;
    Ok(())
}

//! DuckDB storage layer for TaskVault.
//!
//! Stores accounts and encrypted task records. Every sensitive task column
//! holds an opaque base64 envelope produced by `taskvault-crypto`; the store
//! itself never sees plaintext.
//!
//! # Architecture
//!
//! - `TaskStore` owns the DuckDB connection and the raw storage contract:
//!   user and task CRUD, the lagging-generation scan for key rotation, and
//!   the two transactional rewrites (rotation batches, whole-user salt
//!   rotation)
//! - `TaskManager` layers typed encryption on top: encrypts on write under
//!   the active generation, decrypts on read with each record's stored
//!   generation
//! - The schema is created on open; all methods are synchronous, and async
//!   callers wrap them in `spawn_blocking`

mod error;
mod manager;
mod records;
mod task_store;

pub use error::{StorageError, StorageResult};
pub use manager::TaskManager;
pub use records::{DecryptedTask, EncryptedTaskFields, TaskData, TaskRecord, UserRecord};
pub use task_store::TaskStore;

/// Open a DuckDB connection with stale WAL recovery and resource limits.
///
/// If the initial open fails and a `.wal` file exists alongside the database,
/// it is removed and the open is retried once. This handles the common case
/// where an unclean shutdown leaves a WAL file that prevents reopening.
///
/// `memory_limit` and `threads` cap per-database resource usage (DuckDB
/// defaults to ~80% of system RAM and all cores, which is far too aggressive
/// for a task database).
pub fn open_duckdb_with_wal_recovery(
    path: &std::path::Path,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<duckdb::Connection> {
    let conn = match duckdb::Connection::open(path) {
        Ok(c) => c,
        Err(first_err) => {
            let wal_path = path.with_extension(
                path.extension()
                    .map(|ext| format!("{}.wal", ext.to_string_lossy()))
                    .unwrap_or_else(|| "wal".to_string()),
            );
            if wal_path.exists() {
                eprintln!(
                    "[WARN] DuckDB open failed, removing stale WAL and retrying: {}",
                    wal_path.display()
                );
                if std::fs::remove_file(&wal_path).is_ok() {
                    let c = duckdb::Connection::open(path)?;
                    apply_resource_limits(&c, memory_limit, threads)?;
                    return Ok(c);
                }
            }
            return Err(first_err.into());
        }
    };
    apply_resource_limits(&conn, memory_limit, threads)?;
    Ok(conn)
}

/// Apply memory and thread limits to a DuckDB connection.
fn apply_resource_limits(
    conn: &duckdb::Connection,
    memory_limit: &str,
    threads: u32,
) -> StorageResult<()> {
    conn.execute_batch(&format!(
        "PRAGMA memory_limit='{}'; PRAGMA threads={};",
        memory_limit, threads
    ))?;
    Ok(())
}

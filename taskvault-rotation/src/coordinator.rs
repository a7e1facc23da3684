//! Background key rotation coordinator.
//!
//! A single long-lived task that periodically scans for task rows encrypted
//! under a generation older than the active one and re-encrypts them in
//! bounded batches. Store calls run on the blocking pool so the scan never
//! stalls the runtime.

use taskvault_crypto::EncryptionService;
use taskvault_storage::{TaskRecord, TaskStore};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::RotationConfig;
use crate::error::{RotationError, RotationResult};
use crate::rekey::reencrypt_task;

/// Commands that can be sent to the rotation coordinator.
#[derive(Debug)]
pub enum RotationCommand {
    /// Run a rotation cycle now instead of waiting for the timer.
    RotateNow,
    /// Stop the coordinator.
    Stop,
}

/// Outcome of one rotation cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Rows re-encrypted and persisted this cycle.
    pub rotated: usize,
    /// Rows skipped after a per-record failure, left for a later cycle.
    pub skipped: usize,
}

/// Handle for sending commands to a running rotation coordinator.
#[derive(Clone)]
pub struct RotationHandle {
    command_tx: mpsc::Sender<RotationCommand>,
}

impl RotationHandle {
    /// Requests an immediate rotation cycle.
    pub async fn rotate_now(&self) -> RotationResult<()> {
        self.command_tx
            .send(RotationCommand::RotateNow)
            .await
            .map_err(|_| RotationError::NotRunning)
    }

    /// Stops the coordinator loop.
    pub async fn stop(&self) -> RotationResult<()> {
        self.command_tx
            .send(RotationCommand::Stop)
            .await
            .map_err(|_| RotationError::NotRunning)
    }
}

/// Background task that converges stored rows onto the active generation.
pub struct RotationCoordinator {
    store: TaskStore,
    crypto: EncryptionService,
    config: RotationConfig,
    command_rx: mpsc::Receiver<RotationCommand>,
}

/// Creates a rotation coordinator and the handle that commands it.
///
/// The coordinator does nothing until `run()` is spawned on a runtime.
pub fn create_rotation_coordinator(
    store: TaskStore,
    crypto: EncryptionService,
    config: RotationConfig,
) -> (RotationHandle, RotationCoordinator) {
    let (command_tx, command_rx) = mpsc::channel(32);

    let handle = RotationHandle { command_tx };
    let coordinator = RotationCoordinator {
        store,
        crypto,
        config,
        command_rx,
    };

    (handle, coordinator)
}

impl RotationCoordinator {
    /// Runs the rotation loop until stopped.
    pub async fn run(mut self) {
        info!(
            "rotation coordinator started (generation {}, scan every {}s, batches of {})",
            self.crypto.active_generation(),
            self.config.scan_interval_secs,
            self.config.batch_size
        );

        let mut scan_interval = tokio::time::interval(self.config.scan_interval());
        // Skip first immediate tick
        scan_interval.tick().await;

        loop {
            tokio::select! {
                _ = scan_interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!("rotation cycle failed: {e}");
                    }
                }
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(RotationCommand::RotateNow) => {
                            if let Err(e) = self.run_cycle().await {
                                error!("rotation cycle failed: {e}");
                            }
                        }
                        Some(RotationCommand::Stop) => {
                            info!("rotation coordinator stopping");
                            break;
                        }
                        None => {
                            info!("command channel closed, stopping rotation coordinator");
                            break;
                        }
                    }
                }
            }
        }

        info!("rotation coordinator stopped");
    }

    /// Runs one scan-and-rewrite cycle.
    ///
    /// A record that fails to re-encrypt is logged and skipped; the rest of
    /// the batch still commits and the row is picked up again next cycle.
    pub async fn run_cycle(&self) -> RotationResult<CycleOutcome> {
        let active = self.crypto.active_generation();
        let batch_size = self.config.batch_size;

        let store = self.store.clone();
        let batch =
            tokio::task::spawn_blocking(move || store.lagging_tasks(active, batch_size)).await??;

        if batch.is_empty() {
            debug!("no rows lagging behind generation {active}");
            return Ok(CycleOutcome::default());
        }

        let user_ids: Vec<Uuid> = batch.iter().map(|record| record.user_id).collect();
        let store = self.store.clone();
        let salts = tokio::task::spawn_blocking(move || store.user_salts(&user_ids)).await??;

        let mut rewritten: Vec<TaskRecord> = Vec::with_capacity(batch.len());
        let mut skipped = 0usize;
        for record in &batch {
            let Some(salt) = salts.get(&record.user_id) else {
                warn!("skipping task {} (owner {} has no salt)", record.id, record.user_id);
                skipped += 1;
                continue;
            };
            match reencrypt_task(&self.crypto, record, salt, salt) {
                Ok(updated) => rewritten.push(updated),
                Err(e) => {
                    warn!("skipping task {} (re-encryption failed: {e})", record.id);
                    skipped += 1;
                }
            }
        }

        let rotated = rewritten.len();
        if rotated > 0 {
            let store = self.store.clone();
            tokio::task::spawn_blocking(move || store.rewrite_batch(&rewritten)).await??;
        }

        info!("rotated {rotated} tasks to generation {active} ({skipped} skipped)");
        Ok(CycleOutcome { rotated, skipped })
    }
}

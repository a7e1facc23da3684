//! Rotation coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Tuning for the background rotation coordinator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RotationConfig {
    /// Seconds between scans for rows encrypted under an old generation.
    pub scan_interval_secs: u64,
    /// Maximum number of task rows re-encrypted per cycle.
    pub batch_size: usize,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 600, // 10 minutes
            batch_size: 50,
        }
    }
}

impl RotationConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }
}

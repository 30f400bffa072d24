//! VeSync integration configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the VeSync integration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VeSyncConfig {
    /// JSON device snapshot served by the bundled snapshot client.
    pub snapshot_path: PathBuf,
    /// Interval between coordinator refreshes, in seconds.
    pub update_interval_secs: u64,
    /// Per-topic buffer of the discovery dispatcher.
    pub discovery_capacity: usize,
}

impl Default for VeSyncConfig {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from("vesync-devices.json"),
            update_interval_secs: 60,
            discovery_capacity: 16,
        }
    }
}

impl VeSyncConfig {
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_secs(self.update_interval_secs)
    }
}

//! Process supervisor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process supervisor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Delay before the post-start health probe fires
    pub health_probe_delay_ms: u64,
    /// Pause between stop and start during a restart, so the old backend
    /// can remove its port file before the new one writes it
    pub restart_settle_ms: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            health_probe_delay_ms: 2000,
            restart_settle_ms: 500,
        }
    }
}

impl DaemonConfig {
    pub fn health_probe_delay(&self) -> Duration {
        Duration::from_millis(self.health_probe_delay_ms)
    }

    pub fn restart_settle(&self) -> Duration {
        Duration::from_millis(self.restart_settle_ms)
    }
}

//! Backend process and HTTP API configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Directory under the user's home where the backend keeps its databases
pub const BACKEND_DATA_DIR: &str = ".quarry/data";

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Executable name searched for in the well-known install locations
    pub executable_name: String,
    /// Explicit executable path; skips the locator when set
    pub executable_path: Option<PathBuf>,
    /// Root holding `<database>/serve.port` (defaults to `~/.quarry/data`)
    pub data_root: Option<PathBuf>,
    /// Host the backend listens on
    pub host: String,
    /// Database served and searched
    pub database: String,
    /// Per-request HTTP timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            executable_name: "quarry".to_string(),
            executable_path: None,
            data_root: None,
            host: "127.0.0.1".to_string(),
            database: "default".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl BackendConfig {
    /// Resolve the data root, falling back to `<home>/.quarry/data`
    pub fn data_root(&self) -> PathBuf {
        self.data_root.clone().unwrap_or_else(default_data_root)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `<home>/.quarry/data`, or a relative `.quarry/data` when no home is known
pub fn default_data_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().join(BACKEND_DATA_DIR))
        .unwrap_or_else(|| PathBuf::from(BACKEND_DATA_DIR))
}

//! Configuration for the quarry menu-bar front-end

mod backend;
mod daemon;
mod logging;
mod search;

pub use backend::{default_data_root, BackendConfig, BACKEND_DATA_DIR};
pub use daemon::DaemonConfig;
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use search::{DiscoveryConfig, SearchConfig};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend executable and HTTP API
    #[serde(default)]
    pub backend: BackendConfig,
    /// Process supervisor timings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Debounced search
    #[serde(default)]
    pub search: SearchConfig,
    /// Database discovery
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Default config file location (`<config dir>/quarry-menubar/config.toml`)
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("", "", "quarry-menubar")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Load configuration from a TOML file and validate it.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate all configuration fields.
    ///
    /// Collects every problem and reports them together.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.backend.executable_name.trim().is_empty() {
            errors.push("backend.executable_name must not be empty".to_string());
        }
        if self.backend.database.trim().is_empty() {
            errors.push("backend.database must not be empty".to_string());
        }
        if self.backend.database.contains('/') || self.backend.database.contains('\\') {
            errors.push(format!(
                "backend.database must be a plain name, got '{}'",
                self.backend.database
            ));
        }
        if self.backend.host.trim().is_empty() {
            errors.push("backend.host must not be empty".to_string());
        }
        if self.backend.request_timeout_secs == 0 {
            errors.push("backend.request_timeout_secs must be positive".to_string());
        }

        if self.search.debounce_ms == 0 {
            errors.push("search.debounce_ms must be positive".to_string());
        }
        if self.search.result_limit == 0 {
            errors.push("search.result_limit must be positive".to_string());
        }

        if self.discovery.timeout_ms == 0 {
            errors.push("discovery.timeout_ms must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

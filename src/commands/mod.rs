mod daemon;
mod databases;
mod library;
mod search;

pub use daemon::serve;
pub use databases::{list_databases, select_database};
pub use library::{list_collections, list_documents, show_status};
pub use search::{search_once, watch};

use anyhow::{Context, Result};
use quarry_menubar::{
    client::QuarryClient,
    config::Config,
    daemon::{LaunchSpec, ProcessSupervisor},
    discovery::{CommandSource, DatabaseCoordinator},
    locator::locate_executable,
    store::{StateStore, SELECTED_DATABASE_KEY},
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

/// Wiring shared by every subcommand
pub struct AppContext {
    pub config: Config,
    pub store: Arc<StateStore>,
    /// Database for this invocation: `--db`, then the persisted selection,
    /// then `backend.database`
    pub database: String,
}

impl AppContext {
    pub fn open(config: Config, database: Option<String>) -> Result<Self> {
        let state_file = config.discovery.state_file();
        let store = StateStore::open(&state_file)
            .with_context(|| format!("Failed to open state file '{}'", state_file.display()))?;

        let database = database
            .or_else(|| store.get(SELECTED_DATABASE_KEY))
            .unwrap_or_else(|| config.backend.database.clone());
        debug!("Using database '{}'", database);

        Ok(Self {
            config,
            store: Arc::new(store),
            database,
        })
    }

    /// Configured executable path, else the first installed candidate
    pub fn executable(&self) -> Option<PathBuf> {
        self.config
            .backend
            .executable_path
            .clone()
            .or_else(|| locate_executable(&self.config.backend.executable_name))
    }

    pub fn client(&self) -> Result<QuarryClient> {
        let client = QuarryClient::new(&self.config.backend)
            .context("Failed to create HTTP client")?
            .for_database(self.database.clone());
        Ok(client)
    }

    pub fn supervisor(&self) -> Result<ProcessSupervisor> {
        let launch = LaunchSpec::serve(
            self.executable(),
            &self.config.backend.executable_name,
            &self.database,
        );
        Ok(ProcessSupervisor::new(
            launch,
            self.config.daemon.clone(),
            Some(Arc::new(self.client()?)),
        ))
    }

    pub fn discovery(&self) -> DatabaseCoordinator {
        let source = CommandSource::databases_json(
            self.executable(),
            &self.config.backend.executable_name,
        );
        DatabaseCoordinator::new(
            Arc::new(source),
            Arc::clone(&self.store),
            self.config.discovery.timeout(),
            &self.database,
        )
    }
}

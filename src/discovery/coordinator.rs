//! Database discovery coordinator
//!
//! Runs at most one discovery at a time, gives up on slow ones after a
//! timeout, and falls back to the last persisted listing.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::store::{
    StateStore, CACHED_DATABASES_KEY, DATABASES_REFRESHED_AT_KEY, SELECTED_DATABASE_KEY,
};
use crate::types::DatabaseInfo;

use super::source::DiscoverySource;

/// Observable discovery state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverySnapshot {
    /// A discovery is in flight
    pub is_discovering: bool,
    /// The last attempt lost the race against the timeout
    pub timed_out: bool,
    /// Last good listing, discovered or loaded from cache
    pub available_databases: Vec<DatabaseInfo>,
    /// Currently selected database name
    pub selected_database: String,
    /// When `available_databases` was last discovered live
    pub last_refreshed: Option<DateTime<Utc>>,
}

/// Result of one [`DatabaseCoordinator::load_databases`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Another discovery was already running
    AlreadyRunning,
    /// Listing replaced with this many databases
    Refreshed(usize),
    /// Gave up waiting; listing unchanged
    TimedOut,
    /// Discovery failed; listing unchanged
    Failed(String),
}

pub struct DatabaseCoordinator {
    source: Arc<dyn DiscoverySource>,
    store: Arc<StateStore>,
    timeout: Duration,
    state: watch::Sender<DiscoverySnapshot>,
}

impl DatabaseCoordinator {
    /// Create a coordinator seeded from `store`.
    ///
    /// The cached listing and selection are visible immediately, before any
    /// live discovery. Without a persisted selection `default_database` is
    /// selected.
    pub fn new(
        source: Arc<dyn DiscoverySource>,
        store: Arc<StateStore>,
        timeout: Duration,
        default_database: &str,
    ) -> Self {
        let available_databases: Vec<DatabaseInfo> =
            store.get(CACHED_DATABASES_KEY).unwrap_or_default();
        let selected_database = store
            .get::<String>(SELECTED_DATABASE_KEY)
            .unwrap_or_else(|| default_database.to_string());
        let last_refreshed = store.get(DATABASES_REFRESHED_AT_KEY);

        debug!(
            "Seeded {} cached databases, selected '{}'",
            available_databases.len(),
            selected_database
        );

        let (state, _) = watch::channel(DiscoverySnapshot {
            is_discovering: false,
            timed_out: false,
            available_databases,
            selected_database,
            last_refreshed,
        });

        Self {
            source,
            store,
            timeout,
            state,
        }
    }

    pub fn snapshot(&self) -> DiscoverySnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DiscoverySnapshot> {
        self.state.subscribe()
    }

    pub fn available_databases(&self) -> Vec<DatabaseInfo> {
        self.state.borrow().available_databases.clone()
    }

    pub fn selected_database(&self) -> String {
        self.state.borrow().selected_database.clone()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Discover databases once.
    ///
    /// Returns immediately if a discovery is already in flight. The busy
    /// flag is cleared on every exit path, including when this future is
    /// dropped before completion.
    pub async fn load_databases(&self) -> DiscoveryOutcome {
        let started = self.state.send_if_modified(|s| {
            if s.is_discovering {
                false
            } else {
                s.is_discovering = true;
                s.timed_out = false;
                true
            }
        });
        if !started {
            debug!("Database discovery already in flight");
            return DiscoveryOutcome::AlreadyRunning;
        }

        let _busy = BusyGuard { state: &self.state };

        match tokio::time::timeout(self.timeout, self.source.discover_databases()).await {
            Ok(Ok(databases)) => {
                let count = databases.len();
                let now = Utc::now();
                info!("Discovered {} databases", count);
                self.persist(&databases, now);
                self.state.send_modify(|s| {
                    s.available_databases = databases;
                    s.timed_out = false;
                    s.last_refreshed = Some(now);
                });
                DiscoveryOutcome::Refreshed(count)
            }
            Ok(Err(e)) => {
                warn!("Database discovery failed: {}", e);
                DiscoveryOutcome::Failed(e.to_string())
            }
            Err(_) => {
                warn!(
                    "Database discovery timed out after {:?}, keeping last known list",
                    self.timeout
                );
                self.state.send_modify(|s| s.timed_out = true);
                DiscoveryOutcome::TimedOut
            }
        }
    }

    /// Select `name` and persist it. Returns `false` if it was already selected.
    ///
    /// Selection does not trigger discovery.
    pub fn select_database(&self, name: &str) -> bool {
        let changed = self.state.send_if_modified(|s| {
            if s.selected_database == name {
                false
            } else {
                s.selected_database = name.to_string();
                true
            }
        });
        if changed {
            info!("Selected database '{}'", name);
            if let Err(e) = self.store.set(SELECTED_DATABASE_KEY, name) {
                warn!("Failed to persist selected database: {:#}", e);
            }
        }
        changed
    }

    fn persist(&self, databases: &[DatabaseInfo], refreshed_at: DateTime<Utc>) {
        if let Err(e) = self.store.set(CACHED_DATABASES_KEY, databases) {
            warn!("Failed to cache database list: {:#}", e);
        }
        if let Err(e) = self.store.set(DATABASES_REFRESHED_AT_KEY, &refreshed_at) {
            warn!("Failed to persist discovery time: {:#}", e);
        }
    }
}

/// Clears `is_discovering` when dropped
struct BusyGuard<'a> {
    state: &'a watch::Sender<DiscoverySnapshot>,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| s.is_discovering = false);
    }
}

//! quarry-menubar: headless core of the quarry menu-bar front-end
//!
//! Supervises a locally installed `quarry` backend and drives it over its
//! local HTTP API:
//! - Backend process supervision with observable lifecycle state
//! - Port discovery through the backend's per-database port file
//! - Single-flight, timeout-bounded database discovery with a persisted cache
//! - Debounced search in which only the newest request can update the view

pub mod client;
pub mod config;
pub mod daemon;
pub mod discovery;
pub mod locator;
pub mod search;
pub mod store;
pub mod types;
pub mod util;

pub use client::{ApiError, QuarryApi, QuarryClient};
pub use config::Config;
pub use daemon::{DaemonState, LaunchSpec, ProcessSupervisor};
pub use discovery::{DatabaseCoordinator, DiscoveryError, DiscoverySnapshot};
pub use search::{SearchCoordinator, SearchState};
pub use store::StateStore;
pub use types::*;

//! Database Discovery
//!
//! Enumerates the databases the backend tooling knows about. Discovery is
//! single-flight and timeout-bounded; the last good listing is cached in the
//! [`StateStore`](crate::store::StateStore) and shown while a refresh runs
//! or after one fails.

pub mod coordinator;
pub mod parse;
pub mod source;

pub use coordinator::{DatabaseCoordinator, DiscoveryOutcome, DiscoverySnapshot};
pub use parse::parse_listing;
pub use source::{CommandSource, DiscoverySource, StaticSource};

use thiserror::Error;

/// Errors from a single discovery attempt
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code:?}: {stderr}")]
    CommandFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unrecognized database listing: {0}")]
    Parse(String),

    #[error("Discovery unavailable: {0}")]
    Unavailable(String),
}

//! Discovery sources
//!
//! Where database listings come from. The coordinator only sees the
//! [`DiscoverySource`] trait, so the real command invocation can be swapped
//! for fixed data in tests.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::types::DatabaseInfo;

use super::parse::parse_listing;
use super::DiscoveryError;

/// Something that can enumerate the available databases
#[async_trait]
pub trait DiscoverySource: Send + Sync {
    async fn discover_databases(&self) -> Result<Vec<DatabaseInfo>, DiscoveryError>;
}

/// Runs the backend tooling (`quarry databases --json`) and parses its stdout.
///
/// The child is killed if the discovery future is dropped.
#[derive(Debug, Clone)]
pub struct CommandSource {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandSource {
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `<executable> databases --json`, falling back to `fallback_name` on `PATH`
    pub fn databases_json(executable: Option<PathBuf>, fallback_name: &str) -> Self {
        let program = executable.unwrap_or_else(|| PathBuf::from(fallback_name));
        Self::new(program, ["databases", "--json"])
    }
}

#[async_trait]
impl DiscoverySource for CommandSource {
    async fn discover_databases(&self) -> Result<Vec<DatabaseInfo>, DiscoveryError> {
        let program = self.program.display().to_string();
        debug!("Running {} {}", program, self.args.join(" "));

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DiscoveryError::Spawn {
                program: program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DiscoveryError::CommandFailed {
                program,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_listing(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Fixed listing, optionally delayed, counting how often it was asked
#[derive(Debug)]
pub struct StaticSource {
    outcome: Result<Vec<DatabaseInfo>, String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(databases: Vec<DatabaseInfo>) -> Self {
        Self {
            outcome: Ok(databases),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Source whose every discovery fails with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of discoveries started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DiscoverySource for StaticSource {
    async fn discover_databases(&self) -> Result<Vec<DatabaseInfo>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone().map_err(DiscoveryError::Unavailable)
    }
}

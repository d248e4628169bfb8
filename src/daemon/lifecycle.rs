//! Backend Lifecycle Management
//!
//! Spawns, watches and stops the backend process, and publishes its
//! [`DaemonState`]. Failures are never retried automatically: a spawn
//! failure or abnormal exit parks the supervisor in `Error` until the user
//! restarts it.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::QuarryApi;
use crate::config::DaemonConfig;

use super::state::DaemonState;

/// How long a stopped backend gets to exit after SIGTERM before it is killed
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Program and arguments used to launch the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<PathBuf>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// `<executable> serve --db <database>`.
    ///
    /// Without a resolved executable the bare `fallback_name` is used and the
    /// OS resolves it through `PATH`.
    pub fn serve(executable: Option<PathBuf>, fallback_name: &str, database: &str) -> Self {
        let program = executable.unwrap_or_else(|| PathBuf::from(fallback_name));
        Self::new(program, ["serve", "--db", database])
    }
}

impl fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Supervisor owning the single backend child process.
///
/// Cloning yields another handle to the same supervisor. When the last
/// handle is dropped the child process is terminated.
#[derive(Clone)]
pub struct ProcessSupervisor {
    inner: Arc<Inner>,
}

struct Inner {
    launch: Mutex<LaunchSpec>,
    config: DaemonConfig,
    health: Option<Arc<dyn QuarryApi>>,
    state: watch::Sender<DaemonState>,
    slot: Mutex<ProcessSlot>,
}

/// Handles tied to the current child process.
///
/// `generation` changes on every start and stop; an exit notification from
/// an older generation is ignored.
#[derive(Default)]
struct ProcessSlot {
    generation: u64,
    terminate: Option<oneshot::Sender<()>>,
    monitor: Option<JoinHandle<()>>,
    probe: Option<JoinHandle<()>>,
}

impl ProcessSupervisor {
    /// Create a stopped supervisor.
    ///
    /// `health` is probed once, `health_probe_delay` after every successful
    /// start. Its outcome is only logged.
    pub fn new(
        launch: LaunchSpec,
        config: DaemonConfig,
        health: Option<Arc<dyn QuarryApi>>,
    ) -> Self {
        let (state, _) = watch::channel(DaemonState::Stopped);
        Self {
            inner: Arc::new(Inner {
                launch: Mutex::new(launch),
                config,
                health,
                state,
                slot: Mutex::new(ProcessSlot::default()),
            }),
        }
    }

    /// Current state
    pub fn state(&self) -> DaemonState {
        self.inner.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<DaemonState> {
        self.inner.state.subscribe()
    }

    pub fn launch_spec(&self) -> LaunchSpec {
        self.inner.launch.lock().clone()
    }

    /// Replace the launch command used by the next start
    pub fn set_launch_spec(&self, launch: LaunchSpec) {
        *self.inner.launch.lock() = launch;
    }

    /// Spawn the backend. No-op unless the state is `Stopped`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut slot = self.inner.slot.lock();
        if *self.inner.state.borrow() != DaemonState::Stopped {
            debug!("Ignoring start in state {}", *self.inner.state.borrow());
            return;
        }

        self.inner.set_state(DaemonState::Starting);

        let launch = self.launch_spec();
        info!("Starting backend: {}", launch);

        let mut command = Command::new(&launch.program);
        command
            .args(&launch.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                error!("Failed to start backend {}: {}", launch.program.display(), e);
                self.inner
                    .set_state(DaemonState::Error(format!("Failed to start: {}", e)));
                return;
            }
        };

        let pid = child.id().unwrap_or_default();
        slot.generation += 1;
        let generation = slot.generation;

        let (terminate_tx, terminate_rx) = oneshot::channel();
        slot.terminate = Some(terminate_tx);
        self.inner.set_state(DaemonState::Running { pid });
        info!("Backend running (PID {})", pid);

        slot.monitor = Some(tokio::spawn(monitor(
            Arc::downgrade(&self.inner),
            child,
            terminate_rx,
            generation,
        )));

        slot.probe = self.inner.health.clone().map(|api| {
            tokio::spawn(health_probe(api, self.inner.config.health_probe_delay()))
        });
    }

    /// Stop the backend.
    ///
    /// Cancels a pending health probe, signals the child to terminate and
    /// sets `Stopped` right away, without waiting for the OS to confirm the
    /// exit.
    pub fn stop(&self) {
        let mut slot = self.inner.slot.lock();

        if let Some(probe) = slot.probe.take() {
            probe.abort();
        }

        slot.generation += 1;
        slot.monitor.take();

        if let Some(terminate) = slot.terminate.take() {
            info!("Stopping backend");
            let _ = terminate.send(());
        }

        self.inner.set_state(DaemonState::Stopped);
    }

    /// Stop, wait `restart_settle`, then start.
    ///
    /// The pause lets the old backend remove its port file before the new
    /// one writes to the same path.
    pub async fn restart(&self) {
        self.stop();
        tokio::time::sleep(self.inner.config.restart_settle()).await;
        self.start();
    }
}

impl Inner {
    fn set_state(&self, next: DaemonState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                debug!("Backend state: {} -> {}", current, next);
                *current = next;
                true
            }
        });
    }

    /// Exit notification from the monitor of `generation`.
    ///
    /// Only a `Running` state of the same generation is replaced; once
    /// `stop` has run, its `Stopped` stands.
    fn on_exit(&self, generation: u64, status: io::Result<ExitStatus>) {
        let mut slot = self.slot.lock();
        if slot.generation != generation || !self.state.borrow().is_running() {
            debug!("Ignoring exit of superseded backend: {:?}", status);
            return;
        }

        slot.terminate = None;
        slot.monitor = None;
        if let Some(probe) = slot.probe.take() {
            probe.abort();
        }

        let next = match status {
            Ok(status) if status.success() => {
                info!("Backend exited cleanly");
                DaemonState::Stopped
            }
            Ok(status) => {
                let message = describe_exit(status);
                warn!("Backend failed: {}", message);
                DaemonState::Error(message)
            }
            Err(e) => {
                warn!("Failed to wait for backend: {}", e);
                DaemonState::Error(format!("Failed to wait for process: {}", e))
            }
        };
        self.set_state(next);
    }
}

/// Own the child until it exits or a stop is requested.
///
/// A dropped terminate sender (supervisor gone) counts as a stop request.
async fn monitor(
    inner: Weak<Inner>,
    mut child: Child,
    terminate: oneshot::Receiver<()>,
    generation: u64,
) {
    let status = tokio::select! {
        status = child.wait() => status,
        _ = terminate => {
            send_terminate(&mut child);
            match tokio::time::timeout(TERMINATE_GRACE, child.wait()).await {
                Ok(status) => debug!("Stopped backend exited: {:?}", status),
                Err(_) => {
                    warn!("Backend did not exit within {:?} of SIGTERM, killing", TERMINATE_GRACE);
                    if let Err(e) = child.kill().await {
                        warn!("Failed to kill backend: {}", e);
                    }
                }
            }
            return;
        }
    };

    if let Some(inner) = inner.upgrade() {
        inner.on_exit(generation, status);
    }
}

async fn health_probe(api: Arc<dyn QuarryApi>, delay: Duration) {
    tokio::time::sleep(delay).await;
    match api.health().await {
        Ok(health) => info!(
            "Backend healthy: status={}, uptime={:.0}s",
            health.status, health.uptime_seconds
        ),
        Err(e) => warn!("Backend health probe failed: {}", e),
    }
}

/// Ask the child to shut down cleanly (SIGTERM on Unix)
fn send_terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: kill(2) with a pid we own; no memory is shared.
            let rc = unsafe { libc::kill(pid as libc::pid_t, libc::SIGTERM) };
            if rc == 0 {
                return;
            }
            debug!("SIGTERM to {} failed: {}", pid, io::Error::last_os_error());
        }
    }

    if let Err(e) = child.start_kill() {
        debug!("Failed to kill backend: {}", e);
    }
}

fn describe_exit(status: ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("Process exited with code {}", code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("Process terminated by signal {}", signal);
        }
    }

    format!("Process exited abnormally: {}", status)
}

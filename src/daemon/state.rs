//! Backend lifecycle state

use std::fmt;

/// Lifecycle state of the supervised backend.
///
/// `Starting` and `Running` imply the supervisor holds a live child process;
/// `Stopped` and `Error` imply it holds none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DaemonState {
    #[default]
    Stopped,
    Starting,
    Running { pid: u32 },
    Error(String),
}

impl DaemonState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            Self::Running { pid } => Some(*pid),
            _ => None,
        }
    }

    /// Error message, if the backend failed
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for DaemonState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stopped => f.write_str("Stopped"),
            Self::Starting => f.write_str("Starting"),
            Self::Running { pid } => write!(f, "Running (PID {})", pid),
            Self::Error(message) => write!(f, "Error: {}", message),
        }
    }
}

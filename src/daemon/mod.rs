//! Daemon Module
//!
//! Supervision of the backend server process.
//!
//! ```text
//!            start()                 spawn ok
//!  Stopped ───────────▶ Starting ───────────────▶ Running(pid)
//!     ▲                    │                        │     │
//!     │                    │ spawn fails    exit ≠ 0│     │ exit 0
//!     │                    ▼                        ▼     │
//!     │                  Error ◀────────────────────┘     │
//!     │                                                   │
//!     └─────────────── stop() from any state ◀────────────┘
//! ```
//!
//! After every successful start a one-shot health probe fires after a short
//! delay; its result is logged and never changes the state.

pub mod lifecycle;
pub mod state;

pub use lifecycle::{LaunchSpec, ProcessSupervisor};
pub use state::DaemonState;

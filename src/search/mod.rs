//! Search Module
//!
//! Debounced search pipeline and the state it publishes.

pub mod coordinator;
pub mod state;

pub use coordinator::SearchCoordinator;
pub use state::SearchState;

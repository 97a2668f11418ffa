//! Process-level serving: binding, the accept loop and lifecycle hooks.

pub mod listener;

pub use listener::{Server, run_app, shutdown_signal};

//! Asynchronous execution of whitelisted commands over HTTP.
//!
//! Submitting a command returns an id immediately; the child process runs in
//! its own task under a configured deadline. Callers poll the id for state
//! and output, and may kill a running execution. Terminal records stay
//! queryable for a retention window, then a background sweeper evicts them.

#[cfg(not(unix))]
compile_error!("execd only supports Unix platforms.");

pub mod cancel;
pub mod config;
pub mod http_server;
pub mod registry;
pub mod runner;
pub mod state;
pub mod sweeper;

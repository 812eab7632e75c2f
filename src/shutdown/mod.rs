// src/shutdown/mod.rs

//! Layered termination of the server process.
//!
//! - [`coordinator`] runs the tiers in order: signal, protocol shutdown,
//!   forced stop with a bounded wait.
//! - [`signal`] builds the platform's kill helper command line.
//! - [`wire`] encodes and sends the protocol-level shutdown command.

pub mod coordinator;
pub mod signal;
pub mod wire;

pub use coordinator::{ShutdownCoordinator, ShutdownReport, KILL_WAIT_CEILING, SIGNAL_HELPER_GRACE};
pub use signal::kill_helper_command;

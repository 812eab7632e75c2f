// src/process/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor and the shutdown coordinator never spawn processes or open
//! sockets directly; they go through a `ProcessBackend`.
//!
//! - `OsProcessBackend` is the production implementation: real child
//!   processes and a real wire-protocol shutdown command.
//! - Tests provide their own backend that hands out scripted processes and
//!   records which commands were spawned.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::process::handle::{ProcessControl, ProcessHandle};
use crate::shutdown::wire;

/// Trait abstracting how processes are started and how the server is asked
/// to shut itself down.
pub trait ProcessBackend: Send + Sync + Debug {
    /// Start `command` (program followed by its arguments).
    fn spawn(&self, command: &[String]) -> Result<Box<dyn ProcessControl>>;

    /// Send the protocol-level shutdown command to the server listening on
    /// `localhost:port`. Returns whether the command was delivered.
    fn send_shutdown(&self, port: u16) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Real backend used in production.
#[derive(Debug, Clone, Default)]
pub struct OsProcessBackend;

impl OsProcessBackend {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessBackend for OsProcessBackend {
    fn spawn(&self, command: &[String]) -> Result<Box<dyn ProcessControl>> {
        let handle = ProcessHandle::spawn(command)?;
        Ok(Box::new(handle))
    }

    fn send_shutdown(&self, port: u16) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(wire::send_shutdown(port))
    }
}

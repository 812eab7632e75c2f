// src/process/mod.rs

//! Process layer: spawning the server, reading its output, stopping it.
//!
//! - [`output`] merges stdout and stderr into one line stream.
//! - [`handle`] defines the `ProcessControl` trait and the OS-backed
//!   `ProcessHandle`.
//! - [`backend`] provides the `ProcessBackend` trait and the production
//!   `OsProcessBackend`. Tests replace it with a fake that never touches the
//!   OS.
//! - [`relay`] keeps draining output once the server is up.

pub mod backend;
pub mod handle;
pub mod output;
pub mod relay;

pub use backend::{OsProcessBackend, ProcessBackend};
pub use handle::{ProcessControl, ProcessHandle};
pub use output::OutputStream;
pub use relay::ConsoleRelay;

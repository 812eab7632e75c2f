// src/watch/mod.rs

//! Startup detection.
//!
//! This module is responsible for:
//! - Scanning a server's output for a readiness or failure marker within a
//!   deadline (`log_watch.rs`).
//! - Pulling the server's reported pid out of the captured text (`pid.rs`).
//!
//! It does **not** own the process; it only reads lines handed to it.

pub mod log_watch;
pub mod pid;

pub use log_watch::{LogWatch, LogWatchResult, WatchOutcome, FAILURE_MARKER, SUCCESS_MARKER};
pub use pid::extract_pid;

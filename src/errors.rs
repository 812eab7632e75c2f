// src/errors.rs

//! Crate-wide error type and result alias.

use std::time::Duration;

use thiserror::Error;

use crate::watch::WatchOutcome;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The log watch ended in `Failure` or `Timeout`.
    #[error("process did not start ({outcome:?})")]
    StartupFailed {
        outcome: WatchOutcome,
        output: String,
    },

    /// The forced stop could not be confirmed within the kill-wait ceiling.
    /// The child is most likely still running.
    #[error("could not confirm that the server process (pid {pid:?}) exited within {waited:?}")]
    ProcessStillAlive { pid: Option<u32>, waited: Duration },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SupervisorError>;

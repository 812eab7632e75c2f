// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::distribution::Distribution;
use crate::errors::{Result, SupervisorError};
use crate::types::{BitSize, Platform};

/// How long the log watch waits for the server to report readiness.
pub const DEFAULT_STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [process]
/// port = 27018
/// ipv6 = false
/// db_dir = "/var/tmp/mongo-data"
/// startup_timeout_ms = 20000
///
/// [distribution]
/// platform = "linux"
/// bitsize = "b64"
///
/// [executable]
/// path = "/opt/mongodb/bin/mongod"
/// ```
///
/// This is the *unvalidated* form; convert it with
/// `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub process: ProcessSection,

    #[serde(default)]
    pub distribution: DistributionSection,

    #[serde(default)]
    pub executable: Option<ExecutableSection>,
}

/// `[process]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessSection {
    pub port: u16,

    #[serde(default)]
    pub ipv6: bool,

    /// Data directory; a temporary one is created when absent.
    #[serde(default)]
    pub db_dir: Option<PathBuf>,

    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
}

fn default_startup_timeout_ms() -> u64 {
    DEFAULT_STARTUP_TIMEOUT.as_millis() as u64
}

/// `[distribution]` section. Both fields default to the running host.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DistributionSection {
    #[serde(default)]
    pub platform: Platform,

    #[serde(default)]
    pub bitsize: BitSize,
}

/// `[executable]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutableSection {
    pub path: PathBuf,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub process: ProcessConfig,
    pub distribution: Distribution,
    pub executable: Option<PathBuf>,
}

impl ConfigFile {
    /// Internal constructor used by the validation layer.
    pub(crate) fn new_unchecked(
        process: ProcessConfig,
        distribution: Distribution,
        executable: Option<PathBuf>,
    ) -> Self {
        Self {
            process,
            distribution,
            executable,
        }
    }
}

/// Settings for one supervised server process.
///
/// Immutable once handed to a supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessConfig {
    port: u16,
    db_dir: Option<PathBuf>,
    ipv6: bool,
    startup_timeout: Duration,
}

impl ProcessConfig {
    /// IPv4-only config with a temporary data directory.
    pub fn new(port: u16) -> Result<Self> {
        if port == 0 {
            return Err(SupervisorError::ConfigError(
                "port must be > 0 (got 0)".to_string(),
            ));
        }
        Ok(Self {
            port,
            db_dir: None,
            ipv6: false,
            startup_timeout: DEFAULT_STARTUP_TIMEOUT,
        })
    }

    pub fn with_db_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.db_dir = Some(dir.into());
        self
    }

    pub fn with_ipv6(mut self, ipv6: bool) -> Self {
        self.ipv6 = ipv6;
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = timeout;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db_dir(&self) -> Option<&Path> {
        self.db_dir.as_deref()
    }

    pub fn is_ipv6(&self) -> bool {
        self.ipv6
    }

    pub fn startup_timeout(&self) -> Duration {
        self.startup_timeout
    }
}

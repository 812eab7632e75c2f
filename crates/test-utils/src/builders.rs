#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use mongovisor::config::ProcessConfig;

/// Builder for `ProcessConfig` to simplify test setup.
pub struct ProcessConfigBuilder {
    port: u16,
    ipv6: bool,
    db_dir: Option<PathBuf>,
    startup_timeout: Option<Duration>,
}

impl ProcessConfigBuilder {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ipv6: false,
            db_dir: None,
            startup_timeout: None,
        }
    }

    pub fn ipv6(mut self, val: bool) -> Self {
        self.ipv6 = val;
        self
    }

    pub fn db_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.db_dir = Some(dir.into());
        self
    }

    pub fn startup_timeout(mut self, timeout: Duration) -> Self {
        self.startup_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ProcessConfig {
        let mut config = ProcessConfig::new(self.port)
            .expect("Failed to build valid process config from builder")
            .with_ipv6(self.ipv6);
        if let Some(dir) = self.db_dir {
            config = config.with_db_dir(dir);
        }
        if let Some(timeout) = self.startup_timeout {
            config = config.with_startup_timeout(timeout);
        }
        config
    }
}

/// Builder for the lines a fake server prints on startup.
#[derive(Debug, Clone, Default)]
pub struct ServerLogBuilder {
    lines: Vec<String>,
}

impl ServerLogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Banner line carrying the pid, as printed by `mongod -v`.
    pub fn banner(mut self, pid: u32, port: u16) -> Self {
        self.lines.push(format!(
            "Mon Oct 12 10:00:00 [initandlisten] MongoDB starting : pid={pid} port={port} dbpath=/tmp/db 64-bit"
        ));
        self
    }

    pub fn line(mut self, line: &str) -> Self {
        self.lines.push(line.to_string());
        self
    }

    pub fn ready(mut self, port: u16) -> Self {
        self.lines.push(format!(
            "Mon Oct 12 10:00:01 [initandlisten] waiting for connections on port {port}"
        ));
        self
    }

    pub fn failed(mut self, reason: &str) -> Self {
        self.lines.push(format!(
            "Mon Oct 12 10:00:01 [initandlisten] exception in initAndListen: {reason}, terminating: failed"
        ));
        self
    }

    pub fn build(self) -> Vec<String> {
        self.lines
    }
}

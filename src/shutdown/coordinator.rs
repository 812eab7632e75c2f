// src/shutdown/coordinator.rs

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::errors::{Result, SupervisorError};
use crate::process::{ProcessBackend, ProcessControl};
use crate::shutdown::signal::kill_helper_command;
use crate::types::Platform;

/// How long the kill helper may run before it is stopped itself.
pub const SIGNAL_HELPER_GRACE: Duration = Duration::from_millis(100);

/// Upper bound for confirming that the forced stop took effect.
///
/// A process holding open files in the data directory (journal files, for
/// instance) can take a moment to go away, so this is not zero, but it is
/// fixed: callers cannot extend it.
pub const KILL_WAIT_CEILING: Duration = Duration::from_secs(1);

/// What each tier did during one shutdown.
///
/// `None` means the tier was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShutdownReport {
    /// Tier 1: whether the kill helper could be run.
    pub signal_sent: Option<bool>,
    /// Tier 2: whether the protocol shutdown command was delivered.
    pub shutdown_command_sent: Option<bool>,
    /// Tier 3: whether a process was force-stopped and reaped.
    pub process_reaped: bool,
    pub exit_code: Option<i32>,
}

/// Runs the three shutdown tiers against one server.
#[derive(Debug)]
pub struct ShutdownCoordinator<'a> {
    backend: &'a dyn ProcessBackend,
    platform: Platform,
    port: u16,
}

impl<'a> ShutdownCoordinator<'a> {
    pub fn new(backend: &'a dyn ProcessBackend, platform: Platform, port: u16) -> Self {
        Self {
            backend,
            platform,
            port,
        }
    }

    /// Signal, then protocol shutdown if the signal could not be sent, then
    /// always a forced stop with a bounded wait.
    ///
    /// Only the last tier can fail: if the process cannot be confirmed dead
    /// within [`KILL_WAIT_CEILING`] this returns
    /// [`SupervisorError::ProcessStillAlive`].
    pub async fn shutdown(
        &self,
        server_pid: Option<u32>,
        process: Option<&mut (dyn ProcessControl + 'static)>,
    ) -> Result<ShutdownReport> {
        let mut report = ShutdownReport::default();

        let signalled = match server_pid {
            Some(pid) => {
                let sent = self.send_signal(pid).await;
                report.signal_sent = Some(sent);
                sent
            }
            None => {
                debug!(tier = 1, "server pid unknown; skipping kill signal");
                false
            }
        };

        if !signalled {
            report.shutdown_command_sent = Some(self.send_shutdown_command().await);
        }

        if let Some(process) = process {
            report.exit_code = self.force_stop(process, server_pid).await?;
            report.process_reaped = true;
        } else {
            debug!(tier = 3, "no process handle; nothing to force-stop");
        }

        Ok(report)
    }

    /// Tier 1: run the platform's kill helper against `pid`.
    ///
    /// The helper gets [`SIGNAL_HELPER_GRACE`] and is then stopped whether or
    /// not it finished. Returns whether the helper could be started; this
    /// says nothing about whether the server actually exited.
    pub async fn send_signal(&self, pid: u32) -> bool {
        let command = kill_helper_command(self.platform, pid);
        info!(tier = 1, pid, cmd = %command.join(" "), "sending termination signal");

        let mut helper = match self.backend.spawn(&command) {
            Ok(helper) => helper,
            Err(e) => {
                error!(tier = 1, pid, error = %e, "could not run kill helper");
                return false;
            }
        };

        sleep(SIGNAL_HELPER_GRACE).await;

        if let Err(e) = helper.stop() {
            debug!(tier = 1, error = %e, "stopping kill helper failed");
        }
        true
    }

    /// Tier 2: ask the server itself to shut down over the wire.
    pub async fn send_shutdown_command(&self) -> bool {
        info!(tier = 2, port = self.port, "sending shutdown command");
        let sent = self.backend.send_shutdown(self.port).await;
        if !sent {
            warn!(tier = 2, port = self.port, "shutdown command could not be delivered");
        }
        sent
    }

    /// Tier 3: force-stop `process` and wait for it, bounded by
    /// [`KILL_WAIT_CEILING`].
    pub async fn force_stop(
        &self,
        process: &mut dyn ProcessControl,
        server_pid: Option<u32>,
    ) -> Result<Option<i32>> {
        let pid = process.id().or(server_pid);

        if let Err(e) = process.stop() {
            warn!(tier = 3, ?pid, error = %e, "forced stop request failed");
        }

        match timeout(KILL_WAIT_CEILING, process.wait()).await {
            Ok(Ok(exit_code)) => {
                info!(tier = 3, ?pid, ?exit_code, "server process exited");
                Ok(exit_code)
            }
            Ok(Err(e)) => {
                // The wait itself returned, so the process is no longer ours
                // to wait for.
                warn!(tier = 3, ?pid, error = %e, "waiting for server process failed");
                Ok(None)
            }
            Err(_) => {
                error!(
                    tier = 3,
                    ?pid,
                    waited = ?KILL_WAIT_CEILING,
                    "server process is still alive after forced stop"
                );
                Err(SupervisorError::ProcessStillAlive {
                    pid,
                    waited: KILL_WAIT_CEILING,
                })
            }
        }
    }
}

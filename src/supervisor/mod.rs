// src/supervisor/mod.rs

//! The composition root: one supervisor owns one server process.
//!
//! Start: prepare the data directory, build the command line, spawn,
//! register the termination hook, watch the log for readiness, then hand the
//! output to a console relay. Stop: cancel the relay, run the shutdown tiers,
//! delete the temporary artifacts.

pub mod artifacts;
pub mod hook;
pub mod state;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use anyhow::anyhow;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::command::{apply_platform_wrapper, build_command_line};
use crate::config::ProcessConfig;
use crate::distribution::{Distribution, NumaTable};
use crate::errors::{Result, SupervisorError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::process::{ConsoleRelay, OsProcessBackend, ProcessBackend, ProcessControl};
use crate::shutdown::ShutdownCoordinator;
use crate::watch::{extract_pid, LogWatch};

pub use artifacts::{CleanupReport, TempArtifacts};
pub use hook::{exit_on_termination, registered_hooks, stop_registered, TerminationHook};
pub use state::{StopTrigger, SupervisorState};

/// Prefix of the data directory created when none is configured.
pub const TEMP_DB_DIR_PREFIX: &str = "mongovisor-db";

/// Everything a supervisor needs from the outside world.
#[derive(Debug, Clone)]
pub struct SupervisorEnv {
    pub backend: Arc<dyn ProcessBackend>,
    pub fs: Arc<dyn FileSystem>,
    pub numa: NumaTable,
}

impl SupervisorEnv {
    pub fn new(backend: Arc<dyn ProcessBackend>, fs: Arc<dyn FileSystem>, numa: NumaTable) -> Self {
        Self { backend, fs, numa }
    }

    /// Real processes, the real filesystem and the host's NUMA topology.
    pub fn system() -> Self {
        let fs = RealFileSystem;
        let numa = NumaTable::detect(&fs);
        Self::new(Arc::new(OsProcessBackend::new()), Arc::new(fs), numa)
    }
}

/// Mutable lifecycle state, guarded by one lock per supervisor.
#[derive(Debug)]
struct Inner {
    process: Option<Box<dyn ProcessControl>>,
    relay: Option<ConsoleRelay>,
    artifacts: TempArtifacts,
    hook: Option<TerminationHook>,
}

/// Owns the lifecycle of one external server process.
pub struct Supervisor {
    distribution: Distribution,
    config: ProcessConfig,
    db_dir: PathBuf,
    command: Vec<String>,
    env: SupervisorEnv,
    server_pid: OnceLock<u32>,
    startup_output: OnceLock<String>,
    state: watch::Sender<SupervisorState>,
    inner: Mutex<Inner>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("distribution", &self.distribution)
            .field("port", &self.config.port())
            .field("db_dir", &self.db_dir)
            .field("state", &self.state())
            .field("server_pid", &self.pid())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Start `executable` for `distribution` with the production environment.
    ///
    /// The executable file is owned by the supervisor from here on and is
    /// deleted on stop.
    pub async fn start(
        distribution: Distribution,
        config: ProcessConfig,
        executable: impl Into<PathBuf>,
    ) -> Result<Arc<Self>> {
        Self::start_with(distribution, config, executable, SupervisorEnv::system()).await
    }

    /// Like [`Supervisor::start`], with an injected environment.
    ///
    /// Returns once the server reported readiness. If it does not, the stop
    /// path runs before the error is returned.
    pub async fn start_with(
        distribution: Distribution,
        config: ProcessConfig,
        executable: impl Into<PathBuf>,
        env: SupervisorEnv,
    ) -> Result<Arc<Self>> {
        let executable = executable.into();

        let (db_dir, owned_db_dir) = match prepare_db_dir(&config, env.fs.as_ref()) {
            Ok(dirs) => dirs,
            Err(e) => {
                error!(error = %e, "could not prepare data directory");
                TempArtifacts::new(None, Some(executable)).cleanup(env.fs.as_ref());
                return Err(e);
            }
        };

        let command = apply_platform_wrapper(
            &distribution,
            &env.numa,
            build_command_line(&config, &executable, &db_dir),
        );

        let (state, _) = watch::channel(SupervisorState::Starting);
        let supervisor = Arc::new(Self {
            distribution,
            config,
            db_dir,
            command,
            env,
            server_pid: OnceLock::new(),
            startup_output: OnceLock::new(),
            state,
            inner: Mutex::new(Inner {
                process: None,
                relay: None,
                artifacts: TempArtifacts::new(owned_db_dir, Some(executable)),
                hook: None,
            }),
        });

        if let Err(err) = supervisor.launch().await {
            error!(port = supervisor.port(), error = %err, "server process did not start");
            supervisor.shutdown(StopTrigger::StartupFailure).await?;
            return Err(err);
        }

        Ok(supervisor)
    }

    /// Spawn, watch the log, and move to `Running` on success.
    async fn launch(self: &Arc<Self>) -> Result<()> {
        let mut inner = self.inner.lock().await;

        let process = self.env.backend.spawn(&self.command)?;
        inner.hook = Some(TerminationHook::register(self));
        let process = inner.process.insert(process);

        let mut output = process
            .take_output()
            .ok_or_else(|| anyhow!("spawned process exposes no output stream"))?;

        let result = LogWatch::for_server(self.config.startup_timeout())
            .watch(&mut output)
            .await;

        if !result.is_success() {
            return Err(SupervisorError::StartupFailed {
                outcome: result.outcome(),
                output: result.into_output(),
            });
        }

        if let Some(pid) = extract_pid(result.output()) {
            let _ = self.server_pid.set(pid);
        } else {
            warn!("server did not report its pid; termination signal will be skipped");
        }
        let _ = self.startup_output.set(result.into_output());

        inner.relay = Some(ConsoleRelay::spawn(output));
        self.state.send_replace(SupervisorState::Running);

        info!(
            port = self.config.port(),
            pid = ?self.pid(),
            db_dir = %self.db_dir.display(),
            "server process is running"
        );
        Ok(())
    }

    /// Stop the server and delete the temporary artifacts.
    ///
    /// Idempotent: once `Stopped`, further calls return `Ok(())` right away.
    /// Fails only if the process cannot be confirmed dead, in which case
    /// nothing is deleted and the state is left unchanged.
    pub async fn stop(&self) -> Result<()> {
        self.shutdown(StopTrigger::Explicit).await
    }

    /// Single stop path shared by `stop()`, failed startups and the
    /// termination hook. The whole body runs under the supervisor lock.
    pub(crate) async fn shutdown(&self, trigger: StopTrigger) -> Result<()> {
        let mut inner = self.inner.lock().await;

        if self.state() == SupervisorState::Stopped {
            debug!(?trigger, "already stopped");
            return Ok(());
        }

        info!(?trigger, port = self.config.port(), pid = ?self.pid(), "stopping server process");

        if let Some(relay) = inner.relay.take() {
            let relayed = relay.shutdown().await;
            debug!(relayed, "console relay stopped");
        }

        let coordinator = ShutdownCoordinator::new(
            self.env.backend.as_ref(),
            self.distribution.platform,
            self.config.port(),
        );
        let report = coordinator
            .shutdown(self.pid(), inner.process.as_deref_mut())
            .await?;
        inner.process = None;

        let cleanup = inner.artifacts.cleanup(self.env.fs.as_ref());
        inner.hook = None;
        self.state.send_replace(SupervisorState::Stopped);

        info!(?trigger, ?report, ?cleanup, "server process stopped");
        Ok(())
    }

    pub fn state(&self) -> SupervisorState {
        *self.state.borrow()
    }

    /// Resolves once the supervisor reached `Stopped`.
    pub async fn stopped(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|s| *s == SupervisorState::Stopped).await;
    }

    /// Server pid as reported in its startup log.
    pub fn pid(&self) -> Option<u32> {
        self.server_pid.get().copied()
    }

    pub fn port(&self) -> u16 {
        self.config.port()
    }

    pub fn config(&self) -> &ProcessConfig {
        &self.config
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn db_dir(&self) -> &Path {
        &self.db_dir
    }

    /// Full command line the server was spawned with.
    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Output captured while waiting for readiness.
    pub fn startup_output(&self) -> Option<&str> {
        self.startup_output.get().map(String::as_str)
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        if self.state() == SupervisorState::Stopped {
            return;
        }
        warn!(port = self.config.port(), "supervisor dropped without stop(); killing server process");
        let fs = Arc::clone(&self.env.fs);
        let inner = self.inner.get_mut();
        if let Some(relay) = inner.relay.as_mut() {
            relay.cancel();
        }

        let killed = match inner.process.as_mut() {
            Some(process) => match process.stop() {
                Ok(()) => true,
                Err(e) => {
                    warn!(error = %e, "killing server process on drop failed; keeping artifacts");
                    false
                }
            },
            None => true,
        };

        // No async wait is possible here; the kill request is taken as final.
        if killed {
            let cleanup = inner.artifacts.cleanup(fs.as_ref());
            debug!(?cleanup, "cleaned up artifacts on drop");
        }
    }
}

/// Resolve the data directory: the configured one (created if missing) or a
/// fresh temporary one. The second element is set only for the latter.
fn prepare_db_dir(
    config: &ProcessConfig,
    fs: &dyn FileSystem,
) -> Result<(PathBuf, Option<PathBuf>)> {
    match config.db_dir() {
        Some(dir) => {
            fs.create_dir_all(dir)?;
            Ok((dir.to_path_buf(), None))
        }
        None => {
            let dir = fs.create_temp_dir(TEMP_DB_DIR_PREFIX)?;
            debug!(path = %dir.display(), "created temporary data directory");
            Ok((dir.clone(), Some(dir)))
        }
    }
}

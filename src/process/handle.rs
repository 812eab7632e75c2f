// src/process/handle.rs

use std::fmt::Debug;
use std::future::Future;
use std::io::ErrorKind;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::{Result, SupervisorError};
use crate::process::output::{spawn_line_pump, OutputStream, OUTPUT_BUFFER_LINES};

/// Control surface of one spawned process.
///
/// Production code uses [`ProcessHandle`]; tests provide scripted fakes.
pub trait ProcessControl: Send + Debug {
    /// OS process id of the spawned process, while known.
    fn id(&self) -> Option<u32>;

    /// Hand out the merged output stream. Only the first call returns it.
    fn take_output(&mut self) -> Option<OutputStream>;

    /// Best-effort forced termination.
    ///
    /// Stopping a process that already exited is not an error.
    fn stop(&mut self) -> Result<()>;

    /// Wait until the process exited and return its exit code, if it had one.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<i32>>> + Send + '_>>;
}

/// A spawned OS process with stderr merged into its output stream.
#[derive(Debug)]
pub struct ProcessHandle {
    command: String,
    child: Child,
    output: Option<OutputStream>,
}

impl ProcessHandle {
    /// Spawn `command[0]` with the remaining elements as arguments.
    ///
    /// The child is killed if the handle is dropped while it still runs.
    pub fn spawn(command: &[String]) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| {
            SupervisorError::ConfigError("cannot spawn an empty command line".to_string())
        })?;
        let rendered = command.join(" ");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            command: rendered.clone(),
            source,
        })?;

        let (tx, output) = OutputStream::channel(OUTPUT_BUFFER_LINES);
        if let Some(stdout) = child.stdout.take() {
            spawn_line_pump(stdout, tx.clone(), "stdout");
        }
        if let Some(stderr) = child.stderr.take() {
            spawn_line_pump(stderr, tx, "stderr");
        }

        info!(pid = ?child.id(), cmd = %rendered, "spawned process");

        Ok(Self {
            command: rendered,
            child,
            output: Some(output),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

impl ProcessControl for ProcessHandle {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn take_output(&mut self) -> Option<OutputStream> {
        self.output.take()
    }

    fn stop(&mut self) -> Result<()> {
        if let Ok(Some(status)) = self.child.try_wait() {
            debug!(cmd = %self.command, ?status, "process already exited; nothing to stop");
            return Ok(());
        }

        match self.child.start_kill() {
            Ok(()) => {
                debug!(cmd = %self.command, "kill requested");
                Ok(())
            }
            // Already reaped by an earlier wait.
            Err(e) if e.kind() == ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<i32>>> + Send + '_>> {
        Box::pin(async move {
            let status = self.child.wait().await?;
            Ok(status.code())
        })
    }
}

// src/supervisor/state.rs

use std::fmt;

/// Lifecycle of a supervisor.
///
/// `Starting -> Running` once the log watch succeeds, `Starting -> Stopped`
/// when it does not, `Running -> Stopped` on stop. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Starting,
    Running,
    Stopped,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// What caused a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopTrigger {
    /// `Supervisor::stop()` called by the host application.
    Explicit,
    /// The server never became ready (or could not be spawned).
    StartupFailure,
    /// The host process received a termination signal.
    TerminationSignal,
}

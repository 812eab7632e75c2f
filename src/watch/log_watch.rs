// src/watch/log_watch.rs

use std::time::Duration;

use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

use crate::logging::SERVER_OUTPUT_TARGET;
use crate::process::OutputStream;

/// Printed by the server once it accepts connections.
pub const SUCCESS_MARKER: &str = "waiting for connections on port";

/// Any output containing this is treated as a failed startup.
pub const FAILURE_MARKER: &str = "failed";

/// How a log watch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The success marker showed up first.
    Success,
    /// The failure marker showed up first, or the stream ended without the
    /// success marker.
    Failure,
    /// Neither marker showed up before the deadline while the stream stayed
    /// open.
    Timeout,
}

/// Captured output plus the outcome of one startup attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogWatchResult {
    output: String,
    outcome: WatchOutcome,
}

impl LogWatchResult {
    pub fn outcome(&self) -> WatchOutcome {
        self.outcome
    }

    pub fn is_success(&self) -> bool {
        self.outcome == WatchOutcome::Success
    }

    /// Everything read until the watch ended, one line per `\n`.
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

/// Bounded scan of an output stream for a success or failure marker.
#[derive(Debug, Clone)]
pub struct LogWatch {
    success: String,
    failure: String,
    timeout: Duration,
}

impl LogWatch {
    pub fn new(success: impl Into<String>, failure: impl Into<String>, timeout: Duration) -> Self {
        Self {
            success: success.into(),
            failure: failure.into(),
            timeout,
        }
    }

    /// Watch with the server's own markers.
    pub fn for_server(timeout: Duration) -> Self {
        Self::new(SUCCESS_MARKER, FAILURE_MARKER, timeout)
    }

    /// Read `output` until a marker is seen, the stream ends, or the timeout
    /// elapses. The deadline holds even if the stream never yields a line.
    ///
    /// The stream is only borrowed, so whatever follows the deciding line
    /// can still be consumed by the caller.
    pub async fn watch(&self, output: &mut OutputStream) -> LogWatchResult {
        let deadline = Instant::now() + self.timeout;
        let mut captured = String::new();

        let outcome = loop {
            match timeout_at(deadline, output.next_line()).await {
                Err(_) => {
                    warn!(timeout = ?self.timeout, "no startup marker before deadline");
                    break WatchOutcome::Timeout;
                }
                Ok(None) => {
                    warn!("output closed before the success marker appeared");
                    break WatchOutcome::Failure;
                }
                Ok(Some(line)) => {
                    debug!(target: SERVER_OUTPUT_TARGET, "{}", line);
                    captured.push_str(&line);
                    captured.push('\n');

                    if let Some(outcome) = self.classify(&line) {
                        break outcome;
                    }
                }
            }
        };

        info!(?outcome, captured_bytes = captured.len(), "log watch finished");
        LogWatchResult {
            output: captured,
            outcome,
        }
    }

    /// Earliest marker in `line`, if any.
    fn classify(&self, line: &str) -> Option<WatchOutcome> {
        match (line.find(&self.success), line.find(&self.failure)) {
            (Some(s), Some(f)) if f < s => Some(WatchOutcome::Failure),
            (Some(_), _) => Some(WatchOutcome::Success),
            (None, Some(_)) => Some(WatchOutcome::Failure),
            (None, None) => None,
        }
    }
}

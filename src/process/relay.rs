// src/process/relay.rs

//! Background drain of the server's output once it is up.

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::logging::SERVER_OUTPUT_TARGET;
use crate::process::output::OutputStream;

/// Keeps reading the server's output so its pipes never fill up.
///
/// Lines are logged at `debug` under the `mongovisor::server` target.
/// The relay ends on its own at end of stream, or when cancelled.
#[derive(Debug)]
pub struct ConsoleRelay {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<u64>,
}

impl ConsoleRelay {
    pub fn spawn(mut output: OutputStream) -> Self {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut relayed = 0u64;
            loop {
                tokio::select! {
                    biased;

                    _ = &mut cancel_rx => {
                        debug!(relayed, "console relay cancelled");
                        break;
                    }
                    line = output.next_line() => match line {
                        Some(line) => {
                            relayed += 1;
                            debug!(target: SERVER_OUTPUT_TARGET, "{}", line);
                        }
                        None => {
                            debug!(relayed, "server output closed; console relay finished");
                            break;
                        }
                    },
                }
            }
            relayed
        });

        Self {
            cancel: Some(cancel_tx),
            handle,
        }
    }

    /// Ask the relay to stop. Safe to call more than once.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            if cancel.send(()).is_err() {
                debug!("console relay already finished while cancelling");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel and wait for the relay task. Returns the number of relayed lines.
    pub async fn shutdown(mut self) -> u64 {
        self.cancel();
        match self.handle.await {
            Ok(relayed) => relayed,
            Err(e) => {
                debug!(error = %e, "console relay task did not finish cleanly");
                0
            }
        }
    }
}

// src/process/output.rs

//! Combined stdout/stderr line stream.

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Lines buffered between the pipe pumps and the consumer.
///
/// When the buffer is full the pumps stop reading, the OS pipe fills up and
/// the child blocks on its next write.
pub const OUTPUT_BUFFER_LINES: usize = 256;

/// Line-oriented view of a child's merged output.
///
/// Ends (`next_line` returns `None`) once every producer has hung up, i.e.
/// both pipes reached end-of-file.
#[derive(Debug)]
pub struct OutputStream {
    rx: mpsc::Receiver<String>,
}

impl OutputStream {
    /// Create a connected sender / stream pair.
    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self { rx })
    }

    /// Next line without its trailing newline, or `None` at end of stream.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

impl From<mpsc::Receiver<String>> for OutputStream {
    fn from(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }
}

/// Forward `reader` line by line into `tx`.
///
/// Invalid UTF-8 is replaced rather than treated as an error. If the stream
/// side is dropped the pump keeps reading and discards, so the child never
/// stalls on a pipe nobody reads.
pub fn spawn_line_pump<R>(reader: R, tx: mpsc::Sender<String>, source: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        let mut forward = true;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if !forward {
                        continue;
                    }
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send(line).await.is_err() {
                        trace!(source, "output stream dropped; discarding further output");
                        forward = false;
                    }
                }
                Err(e) => {
                    debug!(source, error = %e, "reading child output failed");
                    break;
                }
            }
        }

        trace!(source, "output pump finished");
    })
}

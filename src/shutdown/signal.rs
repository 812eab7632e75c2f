// src/shutdown/signal.rs

use crate::types::Platform;

/// Command line of the short-lived helper that asks `pid` to terminate.
///
/// POSIX platforms send SIGINT (`kill -2`), which the server handles as a
/// clean shutdown. The Windows family has no such signal, so `taskkill` is
/// used instead.
pub fn kill_helper_command(platform: Platform, pid: u32) -> Vec<String> {
    if platform.is_windows() {
        vec!["taskkill".to_string(), "/pid".to_string(), pid.to_string()]
    } else {
        vec!["kill".to_string(), "-2".to_string(), pid.to_string()]
    }
}

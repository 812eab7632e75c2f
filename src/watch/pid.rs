// src/watch/pid.rs

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

static PID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"starting : pid=(\d+) port").expect("pid pattern is a valid regex")
});

/// Server pid as reported in its startup banner, e.g.
/// `"... starting : pid=4821 port=27018 ..."`.
///
/// The first match wins. `None` when the banner is missing or the number
/// does not fit a pid.
pub fn extract_pid(output: &str) -> Option<u32> {
    let caps = PID_PATTERN.captures(output)?;
    let digits = caps.get(1)?.as_str();
    match digits.parse::<u32>() {
        Ok(pid) => Some(pid),
        Err(e) => {
            warn!(digits, error = %e, "server reported a pid that does not fit u32; ignoring");
            None
        }
    }
}

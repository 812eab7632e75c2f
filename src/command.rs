// src/command.rs

//! Command line for the server process.
//!
//! Both functions are pure: they only shape argument vectors.

use std::path::Path;

use tracing::warn;

use crate::config::ProcessConfig;
use crate::distribution::{Distribution, NumaTable};
use crate::types::Platform;

/// Base command line: executable, verbosity, port, data directory and the
/// flags that keep a throwaway server small (no preallocation, no HTTP
/// interface, small data files). `--ipv6` is appended when requested.
pub fn build_command_line(
    config: &ProcessConfig,
    executable: &Path,
    db_dir: &Path,
) -> Vec<String> {
    let mut command = vec![
        executable.display().to_string(),
        "-v".to_string(),
        "--port".to_string(),
        config.port().to_string(),
        "--dbpath".to_string(),
        db_dir.display().to_string(),
        "--noprealloc".to_string(),
        "--nohttpinterface".to_string(),
        "--smallfiles".to_string(),
    ];

    if config.is_ipv6() {
        command.push("--ipv6".to_string());
    }

    command
}

/// Prefix `command` with `numactl --interleave=all` on NUMA-capable Linux.
///
/// Other NUMA-capable platforms have no supported wrapper; they get a warning
/// and the unchanged command.
pub fn apply_platform_wrapper(
    distribution: &Distribution,
    numa: &NumaTable,
    command: Vec<String>,
) -> Vec<String> {
    if !numa.is_numa(distribution.platform) {
        return command;
    }

    match distribution.platform {
        Platform::Linux => {
            let mut wrapped = Vec::with_capacity(command.len() + 2);
            wrapped.push("numactl".to_string());
            wrapped.push("--interleave=all".to_string());
            wrapped.extend(command);
            wrapped
        }
        other => {
            warn!(platform = %other, "NUMA platform detected, but no interleave wrapper is supported");
            command
        }
    }
}

// src/logging.rs

//! Logging setup for the `mongovisor` binary.
//!
//! Two kinds of events go through `tracing`:
//! - the supervisor's own lifecycle (`mongovisor::supervisor`,
//!   `mongovisor::shutdown`, ...), with `port`, `pid` and `tier` fields;
//! - the server's relayed console output, one `debug` event per line under
//!   the [`SERVER_OUTPUT_TARGET`] target.
//!
//! `--log-level` sets one level for both. `MONGOVISOR_LOG` takes full
//! `EnvFilter` directives instead, so the server's chatter can be switched
//! on separately, e.g. `MONGOVISOR_LOG=info,mongovisor::server=debug`.
//! Without either, only `info` and above is shown, which hides the relay.

use anyhow::Result;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

/// Environment variable holding `EnvFilter` directives.
pub const LOG_ENV_VAR: &str = "MONGOVISOR_LOG";

/// Target under which relayed server output is logged.
pub const SERVER_OUTPUT_TARGET: &str = "mongovisor::server";

/// Install the global subscriber, writing to stderr.
///
/// Call once, from the binary. The library never installs one itself.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

/// Filter from the CLI level if given, else from `env` directives, else
/// `info`. Unparseable directives fall back to `info`.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    if let Some(level) = cli_level {
        return EnvFilter::new(level_filter(level).to_string());
    }

    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).unwrap_or_else(|e| {
            eprintln!("mongovisor: ignoring invalid {LOG_ENV_VAR} ({e}); using info");
            EnvFilter::new("info")
        }),
        None => EnvFilter::new("info"),
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

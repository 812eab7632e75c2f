// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::types::Platform;

/// Command-line arguments for `mongovisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mongovisor",
    version,
    about = "Launch a database server from an unpacked binary, supervise it, and clean up after it.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Mongovisor.toml` in the current working directory, if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Server executable. A private copy is started and deleted on stop.
    #[arg(long, value_name = "PATH")]
    pub executable: Option<PathBuf>,

    /// Port the server listens on.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Enable IPv6 on the server.
    #[arg(long)]
    pub ipv6: bool,

    /// Data directory. A temporary one is created (and deleted) if omitted.
    #[arg(long, value_name = "DIR")]
    pub db_dir: Option<PathBuf>,

    /// Platform the executable was built for (linux, windows, osx, solaris, freebsd).
    #[arg(long, value_name = "PLATFORM")]
    pub platform: Option<Platform>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `MONGOVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve the configuration and print the command line without starting anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

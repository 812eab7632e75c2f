// src/lib.rs

pub mod cli;
pub mod command;
pub mod config;
pub mod distribution;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod process;
pub mod shutdown;
pub mod supervisor;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::command::{apply_platform_wrapper, build_command_line};
use crate::config::{default_config_path, load_and_validate, ConfigFile, ProcessConfig};
use crate::distribution::{Distribution, NumaTable};
use crate::errors::{Result, SupervisorError};
use crate::fs::{FileSystem, RealFileSystem};

pub use crate::supervisor::{Supervisor, SupervisorEnv, SupervisorState};

/// Settings for one run of the binary, after merging config file and flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub process: ProcessConfig,
    pub distribution: Distribution,
    pub executable: PathBuf,
}

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading + CLI overrides
/// - staging a private copy of the executable
/// - the supervisor (which installs the Ctrl-C / SIGTERM hook)
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = resolve_settings(&args)?;

    if args.dry_run {
        print_dry_run(&settings);
        return Ok(());
    }

    // The binary has no shutdown of its own; a signal ends it after cleanup.
    supervisor::exit_on_termination(true);

    let env = SupervisorEnv::system();
    let staged = stage_executable(
        env.fs.as_ref(),
        &settings.executable,
        settings.process.port(),
    )?;

    let supervisor =
        Supervisor::start_with(settings.distribution, settings.process, staged, env).await?;
    info!(
        port = supervisor.port(),
        pid = ?supervisor.pid(),
        db_dir = %supervisor.db_dir().display(),
        "server is up; press Ctrl-C to stop"
    );

    supervisor.stopped().await;
    Ok(())
}

/// Merge the config file (explicit, or `Mongovisor.toml` if present) with
/// command-line flags. Flags win.
pub fn resolve_settings(args: &CliArgs) -> Result<RunSettings> {
    let file = match &args.config {
        Some(path) => Some(load_and_validate(path)?),
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!(path = %path.display(), "using default config file");
                Some(load_and_validate(&path)?)
            } else {
                None
            }
        }
    };

    merge_settings(args, file)
}

pub fn merge_settings(args: &CliArgs, file: Option<ConfigFile>) -> Result<RunSettings> {
    let file_process = file.as_ref().map(|f| &f.process);

    let port = args
        .port
        .or_else(|| file_process.map(|p| p.port()))
        .ok_or_else(|| {
            SupervisorError::ConfigError(
                "no port given: pass --port or set [process].port".to_string(),
            )
        })?;

    let mut process = ProcessConfig::new(port)?
        .with_ipv6(args.ipv6 || file_process.is_some_and(|p| p.is_ipv6()));
    if let Some(p) = file_process {
        process = process.with_startup_timeout(p.startup_timeout());
    }
    if let Some(dir) = args
        .db_dir
        .clone()
        .or_else(|| file_process.and_then(|p| p.db_dir().map(Path::to_path_buf)))
    {
        process = process.with_db_dir(dir);
    }

    let mut distribution = file
        .as_ref()
        .map(|f| f.distribution)
        .unwrap_or_else(Distribution::detect);
    if let Some(platform) = args.platform {
        distribution.platform = platform;
    }

    let executable = args
        .executable
        .clone()
        .or_else(|| file.and_then(|f| f.executable))
        .ok_or_else(|| {
            SupervisorError::ConfigError(
                "no executable given: pass --executable or set [executable].path".to_string(),
            )
        })?;

    Ok(RunSettings {
        process,
        distribution,
        executable,
    })
}

/// Copy the executable into the temp directory so the supervisor can own
/// (and delete) the copy without touching the original.
pub fn stage_executable(fs: &dyn FileSystem, executable: &Path, port: u16) -> Result<PathBuf> {
    let name = executable
        .file_name()
        .ok_or_else(|| {
            SupervisorError::ConfigError(format!(
                "executable path {:?} does not name a file",
                executable
            ))
        })?
        .to_string_lossy();

    let staged = std::env::temp_dir().join(format!("mongovisor-{port}-{name}"));
    fs.copy_file(executable, &staged)?;
    debug!(from = %executable.display(), to = %staged.display(), "staged server executable");
    Ok(staged)
}

/// Simple dry-run output: print the resolved settings and command line.
fn print_dry_run(settings: &RunSettings) {
    let numa = NumaTable::detect(&RealFileSystem);
    let db_dir = settings
        .process
        .db_dir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("<temporary directory>"));

    let command = apply_platform_wrapper(
        &settings.distribution,
        &numa,
        build_command_line(&settings.process, &settings.executable, &db_dir),
    );

    println!("mongovisor dry-run");
    println!("  platform = {}", settings.distribution.platform);
    println!("  bitsize = {:?}", settings.distribution.bitsize);
    println!("  port = {}", settings.process.port());
    println!("  ipv6 = {}", settings.process.is_ipv6());
    println!("  startup_timeout = {:?}", settings.process.startup_timeout());
    println!();
    println!("command:");
    println!("  {}", command.join(" "));

    debug!("dry-run complete (nothing started)");
}

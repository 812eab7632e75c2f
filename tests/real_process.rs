// tests/real_process.rs
//
// Drives the supervisor against a shell script standing in for the server.

#![cfg(unix)]

mod common;
use crate::common::builders::ProcessConfigBuilder;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use mongovisor::distribution::{Distribution, NumaTable};
use mongovisor::errors::SupervisorError;
use mongovisor::fs::RealFileSystem;
use mongovisor::process::OsProcessBackend;
use mongovisor::types::{BitSize, Platform};
use mongovisor::watch::WatchOutcome;
use mongovisor::{Supervisor, SupervisorEnv, SupervisorState};

type TestResult = Result<(), Box<dyn Error>>;

fn write_script(dir: &Path, name: &str, body: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    Ok(path)
}

fn env() -> SupervisorEnv {
    SupervisorEnv::new(
        Arc::new(OsProcessBackend::new()),
        Arc::new(RealFileSystem),
        NumaTable::none(),
    )
}

fn distribution() -> Distribution {
    Distribution::new(Platform::Linux, BitSize::B64)
}

#[tokio::test]
async fn script_server_starts_and_stops_cleanly() -> TestResult {
    init_tracing();

    let scratch = TempDir::new()?;
    let exe = write_script(
        scratch.path(),
        "fake-mongod",
        r#"echo "MongoDB starting : pid=$$ port=$3 dbpath=$5"
echo "waiting for connections on port $3"
exec sleep 30"#,
    )?;

    let supervisor = with_timeout(Supervisor::start_with(
        distribution(),
        ProcessConfigBuilder::new(47017).build(),
        &exe,
        env(),
    ))
    .await?;

    assert_eq!(supervisor.state(), SupervisorState::Running);
    assert!(supervisor.pid().is_some());
    let db_dir = supervisor.db_dir().to_path_buf();
    assert!(db_dir.is_dir());

    with_timeout(supervisor.stop()).await?;

    assert_eq!(supervisor.state(), SupervisorState::Stopped);
    assert!(!db_dir.exists());
    assert!(!exe.exists());
    Ok(())
}

#[tokio::test]
async fn script_reporting_failure_is_cleaned_up() -> TestResult {
    init_tracing();

    let scratch = TempDir::new()?;
    let data = scratch.path().join("data");
    let exe = write_script(
        scratch.path(),
        "broken-mongod",
        r#"echo "exception in initAndListen: dbpath $5 is locked, terminating: failed"
exit 100"#,
    )?;

    let err = with_timeout(Supervisor::start_with(
        distribution(),
        ProcessConfigBuilder::new(47018).db_dir(&data).build(),
        &exe,
        env(),
    ))
    .await
    .expect_err("start must fail");

    match err {
        SupervisorError::StartupFailed { outcome, output } => {
            assert_eq!(outcome, WatchOutcome::Failure);
            assert!(output.contains("is locked"));
        }
        other => panic!("expected StartupFailed, got {other:?}"),
    }

    // Configured directory stays, the executable goes.
    assert!(data.is_dir());
    assert!(!exe.exists());
    Ok(())
}

#[tokio::test]
async fn script_exiting_silently_fails_fast() -> TestResult {
    init_tracing();

    let scratch = TempDir::new()?;
    let exe = write_script(scratch.path(), "quiet-mongod", "exit 0")?;

    let started = std::time::Instant::now();
    let err = with_timeout(Supervisor::start_with(
        distribution(),
        ProcessConfigBuilder::new(47019).build(),
        &exe,
        env(),
    ))
    .await
    .expect_err("start must fail");

    assert!(matches!(
        err,
        SupervisorError::StartupFailed {
            outcome: WatchOutcome::Failure,
            ..
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(4));
    Ok(())
}

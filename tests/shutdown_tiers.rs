// tests/shutdown_tiers.rs

mod common;
use crate::common::builders::ServerLogBuilder;
use crate::common::fake_backend::{FakeProcessBackend, FakeServer};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::time::{Duration, Instant};

use mongovisor::errors::SupervisorError;
use mongovisor::process::{ProcessBackend, ProcessControl};
use mongovisor::shutdown::{kill_helper_command, ShutdownCoordinator, KILL_WAIT_CEILING};
use mongovisor::types::Platform;

type TestResult = Result<(), Box<dyn Error>>;

const PORT: u16 = 27018;

fn running_server() -> FakeServer {
    FakeServer::running(ServerLogBuilder::new().banner(4821, PORT).ready(PORT).build())
}

fn spawn_server(backend: &FakeProcessBackend) -> Result<Box<dyn ProcessControl>, Box<dyn Error>> {
    Ok(backend.spawn(&["/x/mongod".to_string()])?)
}

#[test]
fn kill_helper_matches_platform_family() {
    assert_eq!(kill_helper_command(Platform::Linux, 42), vec!["kill", "-2", "42"]);
    assert_eq!(kill_helper_command(Platform::OsX, 42), vec!["kill", "-2", "42"]);
    assert_eq!(kill_helper_command(Platform::FreeBsd, 42), vec!["kill", "-2", "42"]);
    assert_eq!(
        kill_helper_command(Platform::Windows, 42),
        vec!["taskkill", "/pid", "42"]
    );
}

#[tokio::test]
async fn unknown_pid_skips_signal_and_sends_shutdown_command() -> TestResult {
    init_tracing();

    let backend = FakeProcessBackend::new(running_server());
    let mut process = spawn_server(&backend)?;
    let coordinator = ShutdownCoordinator::new(&backend, Platform::Linux, PORT);

    let report = with_timeout(coordinator.shutdown(None, Some(process.as_mut()))).await?;

    assert_eq!(report.signal_sent, None);
    assert_eq!(report.shutdown_command_sent, Some(true));
    assert!(report.process_reaped);
    assert_eq!(report.exit_code, Some(0));
    assert!(backend.helper_spawns().is_empty());
    assert_eq!(backend.shutdown_ports(), vec![PORT]);
    assert_eq!(
        backend.events(),
        vec!["spawn:server", format!("shutdown:{PORT}").as_str(), "stop:server", "wait:server"]
    );
    Ok(())
}

#[tokio::test]
async fn delivered_signal_skips_shutdown_command() -> TestResult {
    init_tracing();

    let backend = FakeProcessBackend::new(running_server());
    let mut process = spawn_server(&backend)?;
    let coordinator = ShutdownCoordinator::new(&backend, Platform::Linux, PORT);

    let report = with_timeout(coordinator.shutdown(Some(4821), Some(process.as_mut()))).await?;

    assert_eq!(report.signal_sent, Some(true));
    assert_eq!(report.shutdown_command_sent, None);
    assert!(report.process_reaped);
    assert_eq!(backend.helper_spawns(), vec![kill_helper_command(Platform::Linux, 4821)]);
    assert!(backend.shutdown_ports().is_empty());
    assert_eq!(
        backend.events(),
        vec!["spawn:server", "spawn:helper", "stop:helper", "stop:server", "wait:server"]
    );
    Ok(())
}

#[tokio::test]
async fn windows_signal_uses_taskkill() -> TestResult {
    init_tracing();

    let backend = FakeProcessBackend::new(running_server());
    let coordinator = ShutdownCoordinator::new(&backend, Platform::Windows, PORT);

    assert!(with_timeout(coordinator.send_signal(99)).await);
    assert_eq!(
        backend.helper_spawns(),
        vec![vec!["taskkill".to_string(), "/pid".to_string(), "99".to_string()]]
    );
    Ok(())
}

#[tokio::test]
async fn helper_spawn_failure_falls_through_to_shutdown_command() -> TestResult {
    init_tracing();

    let backend = FakeProcessBackend::new(running_server()).failing_helper_spawn();
    let mut process = spawn_server(&backend)?;
    let coordinator = ShutdownCoordinator::new(&backend, Platform::Linux, PORT);

    let report = with_timeout(coordinator.shutdown(Some(4821), Some(process.as_mut()))).await?;

    assert_eq!(report.signal_sent, Some(false));
    assert_eq!(report.shutdown_command_sent, Some(true));
    assert!(report.process_reaped);
    assert_eq!(backend.shutdown_ports(), vec![PORT]);
    Ok(())
}

/// A launched helper counts as a delivered signal even if the server
/// ignores it; the forced stop is what actually ends the process.
#[tokio::test]
async fn launched_helper_counts_as_signalled_even_if_server_ignores_it() -> TestResult {
    init_tracing();

    let backend = FakeProcessBackend::new(running_server());
    let mut process = spawn_server(&backend)?;
    let coordinator = ShutdownCoordinator::new(&backend, Platform::Linux, PORT);

    let report = with_timeout(coordinator.shutdown(Some(1), Some(process.as_mut()))).await?;

    assert_eq!(report.signal_sent, Some(true));
    assert_eq!(report.shutdown_command_sent, None);
    assert!(backend.events().contains(&"stop:server".to_string()));
    Ok(())
}

#[tokio::test]
async fn undelivered_shutdown_command_still_force_stops() -> TestResult {
    init_tracing();

    let backend = FakeProcessBackend::new(running_server()).shutdown_delivered(false);
    let mut process = spawn_server(&backend)?;
    let coordinator = ShutdownCoordinator::new(&backend, Platform::Linux, PORT);

    let report = with_timeout(coordinator.shutdown(None, Some(process.as_mut()))).await?;

    assert_eq!(report.shutdown_command_sent, Some(false));
    assert!(report.process_reaped);
    Ok(())
}

#[tokio::test]
async fn missing_process_handle_skips_forced_stop() -> TestResult {
    init_tracing();

    let backend = FakeProcessBackend::new(running_server());
    let coordinator = ShutdownCoordinator::new(&backend, Platform::Linux, PORT);

    let report = with_timeout(coordinator.shutdown(None, None)).await?;

    assert!(!report.process_reaped);
    assert_eq!(report.exit_code, None);
    assert_eq!(backend.events(), vec![format!("shutdown:{PORT}")]);
    Ok(())
}

#[tokio::test]
async fn unkillable_process_is_reported_after_the_ceiling() -> TestResult {
    init_tracing();

    let backend = FakeProcessBackend::new(running_server().refuse_to_die());
    let mut process = spawn_server(&backend)?;
    let coordinator = ShutdownCoordinator::new(&backend, Platform::Linux, PORT);

    let started = Instant::now();
    let err = with_timeout(coordinator.force_stop(process.as_mut(), Some(4821)))
        .await
        .expect_err("process refusing to die must be reported");
    let elapsed = started.elapsed();

    match err {
        SupervisorError::ProcessStillAlive { pid, waited } => {
            assert_eq!(pid, Some(4242));
            assert_eq!(waited, KILL_WAIT_CEILING);
        }
        other => panic!("expected ProcessStillAlive, got {other:?}"),
    }
    assert!(elapsed >= KILL_WAIT_CEILING);
    assert!(elapsed < KILL_WAIT_CEILING + Duration::from_secs(2));
    Ok(())
}

// tests/config_loading.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use tempfile::NamedTempFile;

use mongovisor::cli::CliArgs;
use mongovisor::config::{load_and_validate, DEFAULT_STARTUP_TIMEOUT};
use mongovisor::errors::SupervisorError;
use mongovisor::fs::mock::MockFileSystem;
use mongovisor::fs::FileSystem;
use mongovisor::types::{BitSize, Platform};
use mongovisor::{merge_settings, stage_executable};

type TestResult = Result<(), Box<dyn Error>>;

fn write_config(contents: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

fn expect_config_error(contents: &str, needle: &str) -> TestResult {
    let file = write_config(contents)?;
    match load_and_validate(file.path()) {
        Err(SupervisorError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "unexpected message: {msg}");
            Ok(())
        }
        other => panic!("expected ConfigError containing {needle:?}, got {other:?}"),
    }
}

#[test]
fn full_config_is_loaded() -> TestResult {
    init_tracing();

    let file = write_config(
        r#"
[process]
port = 27018
ipv6 = true
db_dir = "/var/tmp/mongo-data"
startup_timeout_ms = 1500

[distribution]
platform = "macos"
bitsize = "b32"

[executable]
path = "/opt/mongodb/bin/mongod"
"#,
    )?;

    let cfg = load_and_validate(file.path())?;

    assert_eq!(cfg.process.port(), 27018);
    assert!(cfg.process.is_ipv6());
    assert_eq!(cfg.process.db_dir(), Some(Path::new("/var/tmp/mongo-data")));
    assert_eq!(cfg.process.startup_timeout(), Duration::from_millis(1500));
    assert_eq!(cfg.distribution.platform, Platform::OsX);
    assert_eq!(cfg.distribution.bitsize, BitSize::B32);
    assert_eq!(cfg.executable, Some(PathBuf::from("/opt/mongodb/bin/mongod")));
    Ok(())
}

#[test]
fn minimal_config_uses_defaults() -> TestResult {
    init_tracing();

    let file = write_config("[process]\nport = 27018\n")?;
    let cfg = load_and_validate(file.path())?;

    assert!(!cfg.process.is_ipv6());
    assert_eq!(cfg.process.db_dir(), None);
    assert_eq!(cfg.process.startup_timeout(), DEFAULT_STARTUP_TIMEOUT);
    assert_eq!(cfg.distribution.platform, Platform::detect());
    assert_eq!(cfg.executable, None);
    Ok(())
}

#[test]
fn zero_port_is_rejected() -> TestResult {
    expect_config_error("[process]\nport = 0\n", "[process].port")
}

#[test]
fn zero_startup_timeout_is_rejected() -> TestResult {
    expect_config_error(
        "[process]\nport = 1\nstartup_timeout_ms = 0\n",
        "startup_timeout_ms",
    )
}

#[test]
fn empty_paths_are_rejected() -> TestResult {
    expect_config_error("[process]\nport = 1\ndb_dir = \"\"\n", "db_dir")?;
    expect_config_error(
        "[process]\nport = 1\n[executable]\npath = \"\"\n",
        "[executable].path",
    )
}

#[test]
fn missing_process_section_is_a_toml_error() -> TestResult {
    let file = write_config("[distribution]\nplatform = \"linux\"\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(SupervisorError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn unknown_platform_is_a_toml_error() -> TestResult {
    let file = write_config("[process]\nport = 1\n[distribution]\nplatform = \"beos\"\n")?;
    assert!(matches!(
        load_and_validate(file.path()),
        Err(SupervisorError::TomlError(_))
    ));
    Ok(())
}

#[test]
fn missing_file_is_an_io_error() {
    assert!(matches!(
        load_and_validate("/definitely/not/here/Mongovisor.toml"),
        Err(SupervisorError::IoError(_))
    ));
}

#[test]
fn flags_override_the_config_file() -> TestResult {
    let file = write_config(
        "[process]\nport = 27018\ndb_dir = \"/from/file\"\nstartup_timeout_ms = 900\n\
         [distribution]\nplatform = \"linux\"\n[executable]\npath = \"/file/mongod\"\n",
    )?;
    let cfg = load_and_validate(file.path())?;
    let args = CliArgs::try_parse_from([
        "mongovisor",
        "--port",
        "28000",
        "--ipv6",
        "--executable",
        "/flag/mongod",
        "--platform",
        "windows",
    ])?;

    let settings = merge_settings(&args, Some(cfg))?;

    assert_eq!(settings.process.port(), 28000);
    assert!(settings.process.is_ipv6());
    assert_eq!(settings.process.db_dir(), Some(Path::new("/from/file")));
    assert_eq!(settings.process.startup_timeout(), Duration::from_millis(900));
    assert_eq!(settings.distribution.platform, Platform::Windows);
    assert_eq!(settings.executable, PathBuf::from("/flag/mongod"));
    Ok(())
}

#[test]
fn port_and_executable_are_required() -> TestResult {
    let no_port = CliArgs::try_parse_from(["mongovisor", "--executable", "/x/mongod"])?;
    assert!(matches!(
        merge_settings(&no_port, None),
        Err(SupervisorError::ConfigError(msg)) if msg.contains("port")
    ));

    let no_exe = CliArgs::try_parse_from(["mongovisor", "--port", "27018"])?;
    assert!(matches!(
        merge_settings(&no_exe, None),
        Err(SupervisorError::ConfigError(msg)) if msg.contains("executable")
    ));

    let zero = CliArgs::try_parse_from(["mongovisor", "--port", "0", "--executable", "/x"])?;
    assert!(merge_settings(&zero, None).is_err());
    Ok(())
}

#[test]
fn staging_copies_the_executable_and_leaves_the_original() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/opt/mongodb/bin/mongod", b"binary".to_vec());

    let staged = stage_executable(&fs, Path::new("/opt/mongodb/bin/mongod"), 27018)?;

    assert_eq!(
        staged,
        std::env::temp_dir().join("mongovisor-27018-mongod")
    );
    assert!(fs.exists(&staged));
    assert!(fs.exists(Path::new("/opt/mongodb/bin/mongod")));
    Ok(())
}

#[test]
fn staging_a_missing_executable_fails() {
    let fs = MockFileSystem::new();
    assert!(stage_executable(&fs, Path::new("/nope/mongod"), 27018).is_err());
}

// tests/command_line.rs

mod common;
use crate::common::builders::ProcessConfigBuilder;

use std::path::Path;

use mongovisor::command::{apply_platform_wrapper, build_command_line};
use mongovisor::distribution::{Distribution, NumaTable};
use mongovisor::types::{BitSize, Platform};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn base_command_line_has_fixed_flags_in_order() {
    let config = ProcessConfigBuilder::new(27018).build();
    let command = build_command_line(&config, Path::new("/x/mongod"), Path::new("/tmp/d"));

    assert_eq!(
        command,
        strings(&[
            "/x/mongod",
            "-v",
            "--port",
            "27018",
            "--dbpath",
            "/tmp/d",
            "--noprealloc",
            "--nohttpinterface",
            "--smallfiles",
        ])
    );
}

#[test]
fn ipv6_flag_is_appended_last() {
    let config = ProcessConfigBuilder::new(27018).ipv6(true).build();
    let command = build_command_line(&config, Path::new("/x/mongod"), Path::new("/tmp/d"));

    assert_eq!(command.len(), 10);
    assert_eq!(command.last().map(String::as_str), Some("--ipv6"));
    assert_eq!(command.iter().filter(|a| *a == "--ipv6").count(), 1);
}

#[test]
fn numa_linux_is_wrapped_with_numactl() {
    let config = ProcessConfigBuilder::new(27018).build();
    let base = build_command_line(&config, Path::new("/x/mongod"), Path::new("/tmp/d"));
    let distribution = Distribution::new(Platform::Linux, BitSize::B64);
    let numa = NumaTable::from_platforms([Platform::Linux]);

    let wrapped = apply_platform_wrapper(&distribution, &numa, base.clone());

    assert_eq!(&wrapped[..2], &strings(&["numactl", "--interleave=all"])[..]);
    assert_eq!(&wrapped[2..], &base[..]);
}

#[test]
fn non_numa_linux_is_left_alone() {
    let config = ProcessConfigBuilder::new(27018).build();
    let base = build_command_line(&config, Path::new("/x/mongod"), Path::new("/tmp/d"));
    let distribution = Distribution::new(Platform::Linux, BitSize::B64);

    let command = apply_platform_wrapper(&distribution, &NumaTable::none(), base.clone());

    assert_eq!(command, base);
}

#[test]
fn numa_capable_non_linux_platform_gets_no_wrapper() {
    let config = ProcessConfigBuilder::new(27018).build();
    let base = build_command_line(&config, Path::new("C:/mongod.exe"), Path::new("C:/d"));
    let distribution = Distribution::new(Platform::Windows, BitSize::B64);
    let numa = NumaTable::from_platforms([Platform::Windows]);

    let command = apply_platform_wrapper(&distribution, &numa, base.clone());

    assert_eq!(command, base);
}

#[test]
fn numa_table_only_reports_listed_platforms() {
    let numa = NumaTable::from_platforms([Platform::Linux]);
    assert!(numa.is_numa(Platform::Linux));
    assert!(!numa.is_numa(Platform::OsX));
    assert!(!NumaTable::none().is_numa(Platform::Linux));
}

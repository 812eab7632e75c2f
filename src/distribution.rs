// src/distribution.rs

//! Target distribution of the server binary and the NUMA capability table.

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::fs::FileSystem;
use crate::types::{BitSize, Platform};

/// Sysfs directory listing one `nodeN` entry per memory node.
const NUMA_NODE_DIR: &str = "/sys/devices/system/node";

/// Platform + bit width of the server binary being supervised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution {
    pub platform: Platform,
    pub bitsize: BitSize,
}

impl Distribution {
    pub fn new(platform: Platform, bitsize: BitSize) -> Self {
        Self { platform, bitsize }
    }

    /// Distribution matching the running host.
    pub fn detect() -> Self {
        Self::new(Platform::detect(), BitSize::detect())
    }
}

/// Set of platforms that are treated as NUMA-capable.
///
/// Whether a capable platform actually gets a wrapper is decided by
/// [`crate::command::apply_platform_wrapper`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumaTable {
    capable: HashSet<Platform>,
}

impl NumaTable {
    /// No platform is NUMA-capable.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_platforms(platforms: impl IntoIterator<Item = Platform>) -> Self {
        Self {
            capable: platforms.into_iter().collect(),
        }
    }

    /// Probe the host.
    ///
    /// Linux is marked capable when sysfs reports more than one memory node
    /// and `numactl` can be found on `PATH`. Other platforms are never probed.
    pub fn detect(fs: &dyn FileSystem) -> Self {
        if Platform::detect() != Platform::Linux {
            return Self::none();
        }

        let nodes = count_memory_nodes(fs, Path::new(NUMA_NODE_DIR));
        let has_numactl = which::which("numactl").is_ok();
        debug!(nodes, has_numactl, "probed NUMA topology");

        if nodes > 1 && has_numactl {
            Self::from_platforms([Platform::Linux])
        } else {
            Self::none()
        }
    }

    pub fn is_numa(&self, platform: Platform) -> bool {
        self.capable.contains(&platform)
    }
}

fn count_memory_nodes(fs: &dyn FileSystem, dir: &Path) -> usize {
    let Ok(entries) = fs.read_dir(dir) else {
        return 0;
    };

    entries
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()))
        .filter(|name| {
            name.strip_prefix("node")
                .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        })
        .count()
}

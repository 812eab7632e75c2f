// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Operating system family the server binary was built for.
///
/// Only used to pick the shape of the command line and the tier-1 kill helper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    Windows,
    #[serde(alias = "osx", alias = "macos")]
    OsX,
    Solaris,
    FreeBsd,
}

impl Platform {
    /// Platform of the running host.
    ///
    /// Unknown targets fall back to `Linux`, which has the most generic
    /// (POSIX) behaviour.
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "windows" => Platform::Windows,
            "macos" => Platform::OsX,
            "solaris" | "illumos" => Platform::Solaris,
            "freebsd" => Platform::FreeBsd,
            _ => Platform::Linux,
        }
    }

    /// Whether this platform belongs to the Windows family.
    pub fn is_windows(self) -> bool {
        matches!(self, Platform::Windows)
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::detect()
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "windows" => Ok(Platform::Windows),
            "osx" | "macos" => Ok(Platform::OsX),
            "solaris" => Ok(Platform::Solaris),
            "freebsd" => Ok(Platform::FreeBsd),
            other => Err(format!(
                "invalid platform: {other} (expected linux, windows, osx, solaris or freebsd)"
            )),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Platform::Linux => "linux",
            Platform::Windows => "windows",
            Platform::OsX => "osx",
            Platform::Solaris => "solaris",
            Platform::FreeBsd => "freebsd",
        };
        f.write_str(s)
    }
}

/// Bit width of the server binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BitSize {
    B32,
    B64,
}

impl BitSize {
    pub fn detect() -> Self {
        if cfg!(target_pointer_width = "32") {
            BitSize::B32
        } else {
            BitSize::B64
        }
    }
}

impl Default for BitSize {
    fn default() -> Self {
        BitSize::detect()
    }
}

impl FromStr for BitSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "32" | "b32" => Ok(BitSize::B32),
            "64" | "b64" => Ok(BitSize::B64),
            other => Err(format!("invalid bitsize: {other} (expected 32 or 64)")),
        }
    }
}

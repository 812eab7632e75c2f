// src/supervisor/artifacts.rs

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::fs::FileSystem;

/// Filesystem state owned by a supervisor and deleted on stop.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    /// Only set when the data directory was created by the supervisor.
    db_dir: Option<PathBuf>,
    executable: Option<PathBuf>,
}

/// Result of one cleanup pass. `None` means there was nothing to delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CleanupReport {
    pub db_dir_removed: Option<bool>,
    pub executable_removed: Option<bool>,
}

impl TempArtifacts {
    pub fn new(owned_db_dir: Option<PathBuf>, executable: Option<PathBuf>) -> Self {
        Self {
            db_dir: owned_db_dir,
            executable,
        }
    }

    pub fn owned_db_dir(&self) -> Option<&Path> {
        self.db_dir.as_deref()
    }

    pub fn executable(&self) -> Option<&Path> {
        self.executable.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.db_dir.is_none() && self.executable.is_none()
    }

    /// Delete the owned data directory and the executable.
    ///
    /// Both paths are taken out first, so a path is attempted at most once
    /// even if deletion fails. Failures are logged, never returned.
    pub fn cleanup(&mut self, fs: &dyn FileSystem) -> CleanupReport {
        let mut report = CleanupReport::default();

        if let Some(dir) = self.db_dir.take() {
            let removed = match fs.remove_dir_all(&dir) {
                Ok(()) => {
                    debug!(path = %dir.display(), "removed temporary data directory");
                    true
                }
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "could not delete temporary data directory");
                    false
                }
            };
            report.db_dir_removed = Some(removed);
        }

        if let Some(exe) = self.executable.take() {
            let removed = match fs.remove_file(&exe) {
                Ok(()) => {
                    debug!(path = %exe.display(), "removed server executable");
                    true
                }
                Err(e) => {
                    warn!(path = %exe.display(), error = %e, "could not delete server executable; giving up on it");
                    false
                }
            };
            report.executable_removed = Some(removed);
        }

        report
    }
}

// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{ConfigFile, ProcessConfig, RawConfigFile};
use crate::distribution::Distribution;
use crate::errors::{Result, SupervisorError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SupervisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let mut process = ProcessConfig::new(raw.process.port)?
            .with_ipv6(raw.process.ipv6)
            .with_startup_timeout(Duration::from_millis(raw.process.startup_timeout_ms));
        if let Some(dir) = raw.process.db_dir {
            process = process.with_db_dir(dir);
        }

        let distribution = Distribution::new(raw.distribution.platform, raw.distribution.bitsize);
        let executable = raw.executable.map(|e| e.path);

        Ok(ConfigFile::new_unchecked(process, distribution, executable))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_process_section(cfg)?;
    validate_executable_section(cfg)?;
    Ok(())
}

fn validate_process_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.process.port == 0 {
        return Err(SupervisorError::ConfigError(
            "[process].port must be > 0 (got 0)".to_string(),
        ));
    }

    if cfg.process.startup_timeout_ms == 0 {
        return Err(SupervisorError::ConfigError(
            "[process].startup_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if let Some(dir) = &cfg.process.db_dir {
        if dir.as_os_str().is_empty() {
            return Err(SupervisorError::ConfigError(
                "[process].db_dir must not be empty; omit it to use a temporary directory"
                    .to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_executable_section(cfg: &RawConfigFile) -> Result<()> {
    if let Some(exe) = &cfg.executable {
        if exe.path.as_os_str().is_empty() {
            return Err(SupervisorError::ConfigError(
                "[executable].path must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

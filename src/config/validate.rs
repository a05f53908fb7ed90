// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DevloopError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::DevloopError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.command, raw.timing))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_watch(cfg)?;
    validate_command(cfg)?;
    validate_timing(cfg)?;
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if let Some(dir) = &cfg.watch.dir {
        if dir.trim().is_empty() {
            return Err(DevloopError::ConfigError(
                "[watch].dir must not be empty".to_string(),
            ));
        }
    }

    // A blank fragment would exclude every path.
    if let Some(pos) = cfg.watch.exclude.iter().position(|e| e.trim().is_empty()) {
        return Err(DevloopError::ConfigError(format!(
            "[watch].exclude entry #{} is blank",
            pos + 1
        )));
    }
    Ok(())
}

fn validate_command(cfg: &RawConfigFile) -> Result<()> {
    if let Some(cmd) = &cfg.command.cmd {
        if cmd.trim().is_empty() {
            return Err(DevloopError::ConfigError(
                "[command].cmd must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_timing(cfg: &RawConfigFile) -> Result<()> {
    if cfg.timing.debounce_ms == Some(0) {
        return Err(DevloopError::ConfigError(
            "[timing].debounce_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

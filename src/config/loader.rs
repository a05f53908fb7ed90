// src/config/loader.rs

use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{DevloopError, Result};
use crate::fs::{FileSystem, RealFileSystem};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    load_with(&RealFileSystem, path.as_ref())
}

/// Same as [`load_from_path`], reading through `fs`.
pub fn load_with(fs: &dyn FileSystem, path: &Path) -> Result<RawConfigFile> {
    let contents = fs.read_to_string(path).map_err(DevloopError::Other)?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Load `explicit` if given, else the default file if it exists.
///
/// An explicitly named file that does not exist is an error; a missing
/// default file is not.
pub fn discover(fs: &dyn FileSystem, explicit: Option<&Path>) -> Result<Option<ConfigFile>> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let default = default_config_path();
            if !fs.exists(&default) {
                return Ok(None);
            }
            default
        }
    };

    let raw = load_with(fs, &path)?;
    Ok(Some(ConfigFile::try_from(raw)?))
}

/// Default config file looked up in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Devloop.toml")
}

// src/errors.rs

//! Crate-wide error types and aliases.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevloopError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Startup walk failed at {path:?}: {source}")]
    Startup {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure to start the configured command.
///
/// These are recovered by the supervisor: it logs them, stays idle, and
/// retries on the next accepted change.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("insufficient arguments in command {command:?} (need a program and at least one operand)")]
    InsufficientArguments { command: String },

    #[error("failed to compile program: {reason}")]
    CompileFailed { reason: String },

    #[error("failed to start program {program:?}: {source}")]
    StartFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by a watch adapter.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("notify: {0}")]
    Notify(#[from] notify::Error),

    #[error("watch backend: {0}")]
    Backend(String),

    #[error("watch adapter is closed")]
    Closed,

    #[error("watch streams were already taken by another consumer")]
    StreamsTaken,
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DevloopError>;

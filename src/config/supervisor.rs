// src/config/supervisor.rs

//! Runtime configuration for the supervisor.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::errors::{DevloopError, Result};
use crate::process::command::split_params;
use crate::watch::{ExclusionSet, WatchAdapter};

/// Durations governing the restart cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Minimum spacing between two accepted events.
    pub debounce: Duration,
    /// Pause between terminating the old process and launching the new one.
    pub settle: Duration,
    /// Time a process gets to exit after the graceful signal.
    pub grace: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(1),
            settle: Duration::from_secs(2),
            grace: Duration::from_secs(2),
        }
    }
}

/// Immutable supervisor configuration. Build with [`SupervisorConfig::builder`].
#[derive(Clone)]
pub struct SupervisorConfig {
    root: PathBuf,
    command: String,
    params: Vec<String>,
    exclusions: ExclusionSet,
    timing: Timing,
    watcher: Arc<dyn WatchAdapter>,
}

impl fmt::Debug for SupervisorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupervisorConfig")
            .field("root", &self.root)
            .field("command", &self.command)
            .field("params", &self.params)
            .field("exclusions", &self.exclusions)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}

impl SupervisorConfig {
    pub fn builder() -> SupervisorConfigBuilder {
        SupervisorConfigBuilder::default()
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn watcher(&self) -> &Arc<dyn WatchAdapter> {
        &self.watcher
    }
}

/// Builder for [`SupervisorConfig`].
#[derive(Default)]
pub struct SupervisorConfigBuilder {
    root: Option<PathBuf>,
    command: Option<String>,
    params: Vec<String>,
    exclusions: ExclusionSet,
    timing: Timing,
    watcher: Option<Arc<dyn WatchAdapter>>,
}

impl SupervisorConfigBuilder {
    /// Directory to monitor (default `.`).
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Comma-separated extra parameters; blank entries are dropped.
    pub fn params_csv(mut self, list: &str) -> Self {
        self.params = split_params(list);
        self
    }

    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclusions(mut self, exclusions: ExclusionSet) -> Self {
        self.exclusions = exclusions;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn debounce(mut self, d: Duration) -> Self {
        self.timing.debounce = d;
        self
    }

    pub fn settle(mut self, d: Duration) -> Self {
        self.timing.settle = d;
        self
    }

    pub fn grace(mut self, d: Duration) -> Self {
        self.timing.grace = d;
        self
    }

    pub fn watcher(mut self, watcher: Arc<dyn WatchAdapter>) -> Self {
        self.watcher = Some(watcher);
        self
    }

    pub fn build(self) -> Result<SupervisorConfig> {
        let command = self
            .command
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                DevloopError::ConfigError("a command to run is required (--cmd)".to_string())
            })?;

        let watcher = self.watcher.ok_or_else(|| {
            DevloopError::ConfigError("a watch adapter must be registered".to_string())
        })?;

        Ok(SupervisorConfig {
            root: self.root.unwrap_or_else(|| PathBuf::from(".")),
            command,
            params: self.params,
            exclusions: self.exclusions,
            timing: self.timing,
            watcher,
        })
    }
}

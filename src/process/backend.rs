// src/process/backend.rs

//! Pluggable process backend abstraction.
//!
//! The supervisor talks to a `ProcessBackend` instead of the launcher and
//! terminator directly. Production uses [`OsProcessBackend`]; tests can
//! substitute a backend that records launches and terminations without
//! spawning anything.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::SupervisorConfig;
use crate::errors::LaunchError;
use crate::fs::RealFileSystem;
use crate::process::handle::ProcessHandle;
use crate::process::launcher::Launcher;
use crate::process::proc_table::ProcessTable;
use crate::process::terminator::Terminator;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstracting how the configured command is started and stopped.
pub trait ProcessBackend: Send + Sync {
    /// Handle to one running instance.
    type Handle: Send;

    /// Start the configured command.
    fn start<'a>(
        &'a self,
        config: &'a SupervisorConfig,
    ) -> BoxFuture<'a, Result<Self::Handle, LaunchError>>;

    /// Stop a running instance. Must complete all termination work before
    /// resolving and must not fail.
    fn terminate(&self, handle: Self::Handle) -> BoxFuture<'_, ()>;

    /// Pid for logging, when the backend knows one.
    fn pid_of(&self, _handle: &Self::Handle) -> Option<u32> {
        None
    }
}

/// Real backend: spawns OS processes and signals them.
#[derive(Debug, Clone)]
pub struct OsProcessBackend {
    launcher: Launcher,
    terminator: Terminator,
}

impl OsProcessBackend {
    pub fn new(launcher: Launcher, terminator: Terminator) -> Self {
        Self {
            launcher,
            terminator,
        }
    }

    /// Backend for `config`: launches relative to its root and uses its
    /// grace period.
    pub fn for_config(config: &SupervisorConfig) -> Self {
        let root: PathBuf = config.root().to_path_buf();
        let table = ProcessTable::new(Arc::new(RealFileSystem), "/proc");
        Self::new(
            Launcher::new(root),
            Terminator::new(config.timing().grace, table),
        )
    }
}

impl ProcessBackend for OsProcessBackend {
    type Handle = ProcessHandle;

    fn start<'a>(
        &'a self,
        config: &'a SupervisorConfig,
    ) -> BoxFuture<'a, Result<ProcessHandle, LaunchError>> {
        Box::pin(async move { self.launcher.start(config.command(), config.params()).await })
    }

    fn terminate(&self, handle: ProcessHandle) -> BoxFuture<'_, ()> {
        Box::pin(async move { self.terminator.terminate(Some(handle)).await })
    }

    fn pid_of(&self, handle: &ProcessHandle) -> Option<u32> {
        handle.pid()
    }
}

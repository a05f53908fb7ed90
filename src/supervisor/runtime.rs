// src/supervisor/runtime.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SupervisorConfig;
use crate::errors::{DevloopError, Result, WatchError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::process::{OsProcessBackend, ProcessBackend};
use crate::supervisor::gate::{DebounceGate, DropReason, Verdict};
use crate::watch::{register_tree, ChangeEvent, WalkSummary, WatchStreams};

/// Externally observable supervisor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorPhase {
    /// No process running.
    Idle,
    /// A process handle is stored.
    Running,
    /// Terminating the old process and launching the new one.
    Restarting,
}

/// Result of handling one change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Dropped(DropReason),
    Restarted,
    LaunchFailed,
}

struct SupervisorState<H> {
    gate: DebounceGate,
    process: Option<H>,
}

/// Restarts the configured command whenever the watched tree changes.
///
/// All mutable state (process handle, debounce timestamp, suppression flag)
/// sits behind one async lock that is held for the whole
/// decide-terminate-settle-launch-store sequence, so at most one process
/// handle exists and two restarts can never interleave.
pub struct Supervisor<B: ProcessBackend = OsProcessBackend> {
    config: SupervisorConfig,
    backend: B,
    fs: Arc<dyn FileSystem>,
    state: Mutex<SupervisorState<B::Handle>>,
    phase: watch::Sender<SupervisorPhase>,
}

impl<B: ProcessBackend> fmt::Debug for Supervisor<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("config", &self.config)
            .field("phase", &*self.phase.borrow())
            .finish_non_exhaustive()
    }
}

impl Supervisor<OsProcessBackend> {
    /// Supervisor that spawns real OS processes.
    pub fn new(config: SupervisorConfig) -> Self {
        let backend = OsProcessBackend::for_config(&config);
        Self::with_backend(config, backend)
    }
}

impl<B: ProcessBackend> Supervisor<B> {
    pub fn with_backend(config: SupervisorConfig, backend: B) -> Self {
        let gate = DebounceGate::new(config.timing().debounce);
        let (phase, _) = watch::channel(SupervisorPhase::Idle);
        Self {
            config,
            backend,
            fs: Arc::new(RealFileSystem),
            state: Mutex::new(SupervisorState {
                gate,
                process: None,
            }),
            phase,
        }
    }

    /// Use `fs` for the startup walk.
    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn phase(&self) -> SupervisorPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SupervisorPhase> {
        self.phase.subscribe()
    }

    /// Whether a process handle is currently stored.
    pub async fn has_process(&self) -> bool {
        self.state.lock().await.process.is_some()
    }

    /// Register every non-excluded directory under the root.
    pub fn initialize(&self) -> Result<WalkSummary> {
        let summary = register_tree(
            self.fs.as_ref(),
            self.config.root(),
            self.config.exclusions(),
            self.config.watcher().as_ref(),
        )?;
        info!(
            root = ?self.config.root(),
            watched = summary.registered.len(),
            excluded = summary.excluded.len(),
            failed = summary.failed.len(),
            "watching directory tree"
        );
        Ok(summary)
    }

    /// Walk the tree, then process events until the exit signal fires or
    /// the event stream closes.
    ///
    /// Adapter errors are logged and never end the loop. A process started
    /// by the last restart is left running; see [`Supervisor::stop_process`].
    pub async fn run(&self) -> Result<()> {
        let streams = self
            .config
            .watcher()
            .take_streams()
            .ok_or(DevloopError::Watch(WatchError::StreamsTaken))?;

        self.initialize()?;

        let WatchStreams {
            mut events,
            mut errors,
            mut exit,
        } = streams;
        let mut errors_open = true;

        info!(cmd = %self.config.command(), "supervisor loop started");

        loop {
            tokio::select! {
                biased;

                _ = &mut exit => {
                    info!("exit signal received; stopping supervisor loop");
                    break;
                }

                event = events.recv() => match event {
                    Some(event) => {
                        self.handle_event(event).await;
                    }
                    None => {
                        info!("watch event stream closed; stopping supervisor loop");
                        break;
                    }
                },

                err = errors.recv(), if errors_open => match err {
                    Some(err) => warn!(error = %err, "watch adapter error"),
                    None => {
                        debug!("watch error stream closed");
                        errors_open = false;
                    }
                },
            }
        }

        info!("supervisor loop finished");
        Ok(())
    }

    /// Apply the gate to `event` and restart the command if it passes.
    pub async fn handle_event(&self, event: ChangeEvent) -> EventOutcome {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        if let Verdict::Drop(reason) = state.gate.evaluate(now, &event, self.config.exclusions()) {
            debug!(path = ?event.path, kind = ?event.kind, ?reason, "dropping change event");
            return EventOutcome::Dropped(reason);
        }

        info!(path = ?event.path, kind = ?event.kind, "modified file");
        self.phase.send_replace(SupervisorPhase::Restarting);

        if let Some(handle) = state.process.take() {
            info!(pid = ?self.backend.pid_of(&handle), "killing the running process");
            self.backend.terminate(handle).await;
        }

        let settle = self.config.timing().settle;
        if !settle.is_zero() {
            tokio::time::sleep(settle).await;
        }

        info!(cmd = %self.config.command(), "starting the program");
        match self.backend.start(&self.config).await {
            Ok(handle) => {
                debug!(pid = ?self.backend.pid_of(&handle), "program started");
                state.process = Some(handle);
                state.gate.arm_suppression();
                self.phase.send_replace(SupervisorPhase::Running);
                EventOutcome::Restarted
            }
            Err(err) => {
                error!(cmd = %self.config.command(), error = %err, "failed to start the program");
                self.phase.send_replace(SupervisorPhase::Idle);
                EventOutcome::LaunchFailed
            }
        }
    }

    /// Terminate the current process, if any. Used on shutdown.
    pub async fn stop_process(&self) {
        let mut state = self.state.lock().await;
        match state.process.take() {
            Some(handle) => {
                info!(pid = ?self.backend.pid_of(&handle), "stopping the running process");
                self.backend.terminate(handle).await;
            }
            None => debug!("no process to stop"),
        }
        self.phase.send_replace(SupervisorPhase::Idle);
    }
}

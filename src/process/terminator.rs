// src/process/terminator.rs

//! Process termination: graceful-then-forced for direct handles, concurrent
//! command-line sweeps for pattern handles.

use std::time::Duration;

use regex::Regex;
use tokio::process::Child;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::process::handle::ProcessHandle;
use crate::process::proc_table::ProcessTable;

/// Default time between the graceful signal and the forced kill.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(2);

/// Signals the terminator can deliver to a pid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    Terminate,
    Kill,
}

#[derive(Debug, Clone)]
pub struct Terminator {
    grace: Duration,
    table: ProcessTable,
}

impl Default for Terminator {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE, ProcessTable::default())
    }
}

impl Terminator {
    pub fn new(grace: Duration, table: ProcessTable) -> Self {
        Self { grace, table }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Terminate `handle` and wait until the work is done.
    ///
    /// `None` is a no-op. No error is ever returned: every failure is logged
    /// and the remaining work continues.
    pub async fn terminate(&self, handle: Option<ProcessHandle>) {
        match handle {
            None => debug!("no process to terminate"),
            Some(ProcessHandle::Direct { mut child }) => {
                self.stop_gracefully(&mut child).await;
            }
            Some(ProcessHandle::Pattern { mut child, patterns }) => {
                self.sweep(&patterns).await;
                reap(&mut child).await;
            }
        }
    }

    /// SIGTERM, wait out the grace period, SIGKILL if still alive, then reap.
    async fn stop_gracefully(&self, child: &mut Child) {
        let Some(pid) = child.id() else {
            debug!("process already reaped");
            return;
        };

        info!(pid, "sending terminate signal to the process");
        if let Err(err) = send_signal(pid as i32, StopSignal::Terminate) {
            warn!(pid, error = %err, "failed to send terminate signal");
        }

        tokio::time::sleep(self.grace).await;

        match child.try_wait() {
            Ok(Some(status)) => debug!(pid, %status, "process exited within grace period"),
            Ok(None) => {
                info!(pid, "process is still running; killing it");
                if let Err(err) = child.start_kill() {
                    warn!(pid, error = %err, "failed to kill the process");
                }
            }
            Err(err) => warn!(pid, error = %err, "failed to check process status"),
        }

        reap(child).await;
    }

    /// Kill every process whose command line matches any of `patterns`.
    ///
    /// One task per pattern; returns only after all of them finished.
    pub async fn sweep(&self, patterns: &[String]) {
        debug!(?patterns, "sweeping processes by command line");
        let mut sweeps = JoinSet::new();

        for pattern in patterns {
            let regex = match Regex::new(pattern) {
                Ok(r) => r,
                Err(err) => {
                    warn!(pattern = %pattern, error = %err, "invalid termination pattern");
                    continue;
                }
            };
            let table = self.table.clone();
            sweeps.spawn(async move { kill_matching(&table, &regex).await });
        }

        let mut killed = 0usize;
        while let Some(res) = sweeps.join_next().await {
            match res {
                Ok(n) => killed += n,
                Err(err) => warn!(error = %err, "termination sweep task failed"),
            }
        }

        info!(killed, "all pattern sweeps finished");
    }
}

/// Returns how many processes were signalled successfully.
async fn kill_matching(table: &ProcessTable, pattern: &Regex) -> usize {
    let pids = match table.find_matching(pattern).await {
        Ok(pids) => pids,
        Err(err) => {
            warn!(pattern = %pattern, error = %err, "failed to find processes by pattern");
            return 0;
        }
    };

    let mut killed = 0;
    for pid in pids {
        match send_signal(pid, StopSignal::Kill) {
            Ok(()) => {
                info!(pid, pattern = %pattern, "killed process");
                killed += 1;
            }
            Err(err) => warn!(pid, pattern = %pattern, error = %err, "failed to kill process"),
        }
    }
    killed
}

/// Make sure the spawned child is gone and collect its exit status.
async fn reap(child: &mut Child) {
    let pid = child.id();
    if let Ok(None) = child.try_wait() {
        if let Err(err) = child.start_kill() {
            warn!(?pid, error = %err, "failed to kill the process");
        }
    }
    match child.wait().await {
        Ok(status) => info!(?pid, %status, "process exited"),
        Err(err) => warn!(?pid, error = %err, "error waiting for process to exit"),
    }
}

#[cfg(unix)]
pub fn send_signal(pid: i32, signal: StopSignal) -> std::io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let signal = match signal {
        StopSignal::Terminate => Signal::SIGTERM,
        StopSignal::Kill => Signal::SIGKILL,
    };
    kill(Pid::from_raw(pid), signal).map_err(std::io::Error::from)
}

#[cfg(not(unix))]
pub fn send_signal(pid: i32, _signal: StopSignal) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("signalling pid {pid} is only supported on unix"),
    ))
}

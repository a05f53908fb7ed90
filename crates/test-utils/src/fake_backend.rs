use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use devloop::config::SupervisorConfig;
use devloop::errors::LaunchError;
use devloop::process::{BoxFuture, CommandSpec, ProcessBackend};

/// One interaction with the fake backend, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Start { id: u32, command: String },
    Terminate { id: u32 },
}

/// Handle for a fake "process".
#[derive(Debug, PartialEq, Eq)]
pub struct FakeHandle {
    pub id: u32,
}

#[derive(Debug, Default)]
struct FakeState {
    next_id: u32,
    calls: Vec<BackendCall>,
    live: usize,
    max_live: usize,
    fail_next: usize,
}

/// A process backend that:
/// - parses the command like the real launcher (so bad commands still fail)
/// - records every start and terminate
/// - tracks how many handles are alive at once.
///
/// Cloning shares the recorded state.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
    delay: Duration,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every start and terminate, to widen races.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Make the next `n` starts fail.
    pub fn fail_next_starts(&self, n: usize) {
        self.lock().fail_next = n;
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    pub fn start_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Start { .. }))
    }

    pub fn terminate_count(&self) -> usize {
        self.count(|c| matches!(c, BackendCall::Terminate { .. }))
    }

    /// Handles started and not yet terminated.
    pub fn live(&self) -> usize {
        self.lock().live
    }

    /// Highest value `live` ever reached.
    pub fn max_live(&self) -> usize {
        self.lock().max_live
    }

    fn count(&self, pred: impl Fn(&BackendCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| pred(c)).count()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

impl ProcessBackend for FakeBackend {
    type Handle = FakeHandle;

    fn start<'a>(
        &'a self,
        config: &'a SupervisorConfig,
    ) -> BoxFuture<'a, Result<FakeHandle, LaunchError>> {
        Box::pin(async move {
            CommandSpec::parse(config.command())?;

            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let mut state = self.lock();
            if state.fail_next > 0 {
                state.fail_next -= 1;
                return Err(LaunchError::StartFailed {
                    program: config.command().to_string(),
                    source: std::io::Error::other("injected start failure"),
                });
            }

            state.next_id += 1;
            let id = state.next_id;
            state.calls.push(BackendCall::Start {
                id,
                command: config.command().to_string(),
            });
            state.live += 1;
            state.max_live = state.max_live.max(state.live);
            Ok(FakeHandle { id })
        })
    }

    fn terminate(&self, handle: FakeHandle) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let mut state = self.lock();
            state.calls.push(BackendCall::Terminate { id: handle.id });
            state.live = state.live.saturating_sub(1);
        })
    }

    fn pid_of(&self, handle: &FakeHandle) -> Option<u32> {
        Some(handle.id)
    }
}

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use devloop::config::{SupervisorConfig, SupervisorConfigBuilder};
use devloop::fs::mock::MockFileSystem;
use devloop::supervisor::Supervisor;
use devloop::watch::mock::MockWatchAdapter;
use devloop::watch::{ChangeEvent, ChangeKind, WatchAdapter};

use crate::fake_backend::FakeBackend;

/// Config builder for tests: root `.`, default debounce, no settle pause,
/// wired to `adapter`.
pub fn config_builder(command: &str, adapter: &MockWatchAdapter) -> SupervisorConfigBuilder {
    SupervisorConfig::builder()
        .root(".")
        .command(command)
        .settle(Duration::ZERO)
        .watcher(Arc::new(adapter.clone()) as Arc<dyn WatchAdapter>)
}

/// Everything a supervisor test needs, sharing state with the supervisor.
pub struct Harness {
    pub supervisor: Arc<Supervisor<FakeBackend>>,
    pub backend: FakeBackend,
    pub adapter: MockWatchAdapter,
    pub fs: MockFileSystem,
}

/// Builder for a [`Harness`].
pub struct HarnessBuilder {
    command: String,
    customize: Box<dyn FnOnce(SupervisorConfigBuilder) -> SupervisorConfigBuilder>,
    backend: FakeBackend,
    fs: MockFileSystem,
}

impl HarnessBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            customize: Box::new(|b| b),
            backend: FakeBackend::new(),
            fs: MockFileSystem::new(),
        }
    }

    pub fn config(
        mut self,
        f: impl FnOnce(SupervisorConfigBuilder) -> SupervisorConfigBuilder + 'static,
    ) -> Self {
        self.customize = Box::new(f);
        self
    }

    pub fn backend(mut self, backend: FakeBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn dir(self, path: &str) -> Self {
        self.fs.add_dir(path);
        self
    }

    pub fn build(self) -> Harness {
        let adapter = MockWatchAdapter::new();
        let config = (self.customize)(config_builder(&self.command, &adapter))
            .build()
            .expect("test config should be valid");
        let supervisor = Supervisor::with_backend(config, self.backend.clone())
            .with_filesystem(Arc::new(self.fs.clone()));

        Harness {
            supervisor: Arc::new(supervisor),
            backend: self.backend,
            adapter,
            fs: self.fs,
        }
    }
}

/// Event of `kind` on `path`.
pub fn event(path: impl Into<PathBuf>, kind: ChangeKind) -> ChangeEvent {
    ChangeEvent::new(path, kind)
}

/// One write event per path.
pub fn writes<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<ChangeEvent> {
    paths.into_iter().map(ChangeEvent::write).collect()
}

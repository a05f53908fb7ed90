// src/watch/mock.rs

//! In-memory watch adapter for tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, oneshot};

use crate::errors::WatchError;
use crate::watch::adapter::{stream_pair, ChangeEvent, WatchAdapter, WatchStreams};

#[derive(Debug, Default)]
struct MockState {
    watched: Vec<PathBuf>,
    rejected: HashSet<PathBuf>,
    closed: bool,
    streams: Option<WatchStreams>,
    exit: Option<oneshot::Sender<()>>,
}

/// Watch adapter that records registrations and lets tests inject events.
///
/// Cloning shares the same state, so a test can keep one clone for
/// injecting events while the supervisor owns another.
#[derive(Debug, Clone)]
pub struct MockWatchAdapter {
    state: Arc<Mutex<MockState>>,
    events: mpsc::UnboundedSender<ChangeEvent>,
    errors: mpsc::UnboundedSender<WatchError>,
}

impl Default for MockWatchAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWatchAdapter {
    pub fn new() -> Self {
        let (senders, streams) = stream_pair();
        let state = MockState {
            streams: Some(streams),
            exit: Some(senders.exit),
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            events: senders.events,
            errors: senders.errors,
        }
    }

    /// Make `add` fail for this path.
    pub fn reject_path(&self, path: impl Into<PathBuf>) {
        self.state.lock().unwrap().rejected.insert(path.into());
    }

    /// Paths currently registered, in registration order.
    pub fn watched(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().watched.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Deliver a change event to the consumer.
    pub fn emit(&self, event: ChangeEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// Deliver an adapter error to the consumer.
    pub fn emit_error(&self, error: WatchError) -> bool {
        self.errors.send(error).is_ok()
    }
}

impl WatchAdapter for MockWatchAdapter {
    fn add(&self, path: &Path) -> Result<(), WatchError> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(WatchError::Closed);
        }
        if state.rejected.contains(path) {
            return Err(WatchError::Backend(format!("cannot watch {:?}", path)));
        }
        state.watched.push(path.to_path_buf());
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), WatchError> {
        let mut state = self.state.lock().unwrap();
        let before = state.watched.len();
        state.watched.retain(|p| p != path);
        if state.watched.len() == before {
            return Err(WatchError::Backend(format!("{:?} is not watched", path)));
        }
        Ok(())
    }

    fn close(&self) -> Result<(), WatchError> {
        let mut state = self.state.lock().unwrap();
        state.closed = true;
        state.watched.clear();
        Ok(())
    }

    fn exit(&self) {
        if let Some(tx) = self.state.lock().unwrap().exit.take() {
            let _ = tx.send(());
        }
    }

    fn take_streams(&self) -> Option<WatchStreams> {
        self.state.lock().unwrap().streams.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_track_registrations() {
        let adapter = MockWatchAdapter::new();
        adapter.add(Path::new("./a")).unwrap();
        adapter.add(Path::new("./b")).unwrap();
        adapter.remove(Path::new("./a")).unwrap();

        assert_eq!(adapter.watched(), vec![PathBuf::from("./b")]);
        assert!(adapter.remove(Path::new("./a")).is_err());
    }

    #[test]
    fn streams_are_handed_out_once() {
        let adapter = MockWatchAdapter::new();
        let mut streams = adapter.take_streams().expect("first take succeeds");
        assert!(adapter.take_streams().is_none());

        assert!(adapter.emit(ChangeEvent::write("./main.go")));
        assert_eq!(
            streams.events.try_recv().unwrap(),
            ChangeEvent::write("./main.go")
        );
    }

    #[test]
    fn closed_adapter_rejects_registration() {
        let adapter = MockWatchAdapter::new();
        adapter.close().unwrap();
        assert!(adapter.is_closed());
        assert!(matches!(adapter.add(Path::new(".")), Err(WatchError::Closed)));
    }
}

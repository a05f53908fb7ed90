// src/watch/adapter.rs

//! The watch capability the supervisor consumes.
//!
//! Anything that can register directories and deliver change notifications
//! can drive the supervisor: the production [`super::NotifyAdapter`] or the
//! in-memory [`super::mock::MockWatchAdapter`] used by tests.

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind};
use tokio::sync::{mpsc, oneshot};

use crate::errors::WatchError;

/// Kind of filesystem change, reduced to what the supervisor cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Create,
    Write,
    Remove,
    Rename,
    Chmod,
    Other,
}

impl ChangeKind {
    /// Only writes and creations can trigger a restart.
    pub fn is_actionable(self) -> bool {
        matches!(self, ChangeKind::Create | ChangeKind::Write)
    }
}

impl From<&EventKind> for ChangeKind {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => ChangeKind::Create,
            EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
            EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Chmod,
            // Some backends only report `Modify(Any)` for content writes.
            EventKind::Modify(_) => ChangeKind::Write,
            EventKind::Remove(_) => ChangeKind::Remove,
            EventKind::Access(_) | EventKind::Any | EventKind::Other => ChangeKind::Other,
        }
    }
}

/// A single path-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn write(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Write)
    }

    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Create)
    }
}

/// Receiving half of an adapter: change events, adapter errors and the
/// single-fire exit signal.
#[derive(Debug)]
pub struct WatchStreams {
    pub events: mpsc::UnboundedReceiver<ChangeEvent>,
    pub errors: mpsc::UnboundedReceiver<WatchError>,
    pub exit: oneshot::Receiver<()>,
}

/// Sending half matching [`WatchStreams`], kept by adapter implementations.
#[derive(Debug)]
pub(crate) struct StreamSenders {
    pub events: mpsc::UnboundedSender<ChangeEvent>,
    pub errors: mpsc::UnboundedSender<WatchError>,
    pub exit: oneshot::Sender<()>,
}

pub(crate) fn stream_pair() -> (StreamSenders, WatchStreams) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (errors_tx, errors_rx) = mpsc::unbounded_channel();
    let (exit_tx, exit_rx) = oneshot::channel();
    (
        StreamSenders {
            events: events_tx,
            errors: errors_tx,
            exit: exit_tx,
        },
        WatchStreams {
            events: events_rx,
            errors: errors_rx,
            exit: exit_rx,
        },
    )
}

/// Directory-registration and notification capability.
pub trait WatchAdapter: Send + Sync {
    /// Register a directory for (non-recursive) change notification.
    fn add(&self, path: &Path) -> Result<(), WatchError>;

    /// Unregister a directory.
    fn remove(&self, path: &Path) -> Result<(), WatchError>;

    /// Release the underlying watcher. Closing ends the event stream.
    fn close(&self) -> Result<(), WatchError>;

    /// Fire the exit signal. Subsequent calls are no-ops.
    fn exit(&self);

    /// Hand the receiving streams to their single consumer.
    ///
    /// Returns `None` once the streams have been taken.
    fn take_streams(&self) -> Option<WatchStreams>;
}

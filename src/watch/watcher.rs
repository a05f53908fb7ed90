// src/watch/watcher.rs

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use crate::errors::WatchError;
use crate::watch::adapter::{stream_pair, ChangeEvent, ChangeKind, WatchAdapter, WatchStreams};

/// Production watch adapter backed by `notify`.
///
/// Directories are registered one by one in non-recursive mode; the
/// supervisor's startup walk decides which ones. Dropping or closing the
/// adapter drops the underlying `RecommendedWatcher`, which closes the event
/// stream.
pub struct NotifyAdapter {
    inner: Mutex<Option<RecommendedWatcher>>,
    streams: Mutex<Option<WatchStreams>>,
    exit: Mutex<Option<oneshot::Sender<()>>>,
}

impl std::fmt::Debug for NotifyAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyAdapter").finish_non_exhaustive()
    }
}

impl NotifyAdapter {
    pub fn new() -> Result<Self, WatchError> {
        let (senders, streams) = stream_pair();

        let watcher = RecommendedWatcher::new(
            forward_events(senders.events, senders.errors),
            Config::default(),
        )?;

        info!("file watcher created");

        Ok(Self {
            inner: Mutex::new(Some(watcher)),
            streams: Mutex::new(Some(streams)),
            exit: Mutex::new(Some(senders.exit)),
        })
    }

    fn watcher(&self) -> Result<MutexGuard<'_, Option<RecommendedWatcher>>, WatchError> {
        self.inner
            .lock()
            .map_err(|_| WatchError::Backend("watcher mutex poisoned".to_string()))
    }
}

/// Build the callback `notify` invokes synchronously on its own thread.
///
/// One `ChangeEvent` is emitted per path in the notify event.
fn forward_events(
    events: mpsc::UnboundedSender<ChangeEvent>,
    errors: mpsc::UnboundedSender<WatchError>,
) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let kind = ChangeKind::from(&event.kind);
            trace!(?event, ?kind, "received notify event");
            for path in event.paths {
                // The receiver is gone once the supervisor stopped.
                let _ = events.send(ChangeEvent { path, kind });
            }
        }
        Err(err) => {
            let _ = errors.send(WatchError::Notify(err));
        }
    }
}

impl WatchAdapter for NotifyAdapter {
    fn add(&self, path: &Path) -> Result<(), WatchError> {
        let mut guard = self.watcher()?;
        let watcher = guard.as_mut().ok_or(WatchError::Closed)?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<(), WatchError> {
        let mut guard = self.watcher()?;
        let watcher = guard.as_mut().ok_or(WatchError::Closed)?;
        watcher.unwatch(path)?;
        Ok(())
    }

    fn close(&self) -> Result<(), WatchError> {
        let mut guard = self.watcher()?;
        if guard.take().is_some() {
            debug!("file watcher closed");
        }
        Ok(())
    }

    fn exit(&self) {
        if let Ok(mut guard) = self.exit.lock() {
            if let Some(tx) = guard.take() {
                let _ = tx.send(());
            }
        }
    }

    fn take_streams(&self) -> Option<WatchStreams> {
        self.streams.lock().ok().and_then(|mut s| s.take())
    }
}

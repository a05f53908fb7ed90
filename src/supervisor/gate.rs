// src/supervisor/gate.rs

//! Pure event gate.
//!
//! Decides whether a change event should restart the command. It owns the
//! debounce timestamp and the self-trigger suppression flag and performs no
//! IO, so it can be tested without Tokio, channels or processes.

use std::time::Duration;

use tokio::time::Instant;

use crate::watch::{ChangeEvent, ExclusionSet};

/// Why an event did not cause a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// First event after a restart; usually caused by the new process itself.
    SelfTrigger,
    /// Too close to the previously accepted event.
    Debounced,
    /// Path matches an exclusion fragment.
    Excluded,
    /// Neither a write nor a creation.
    IgnoredKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Drop(DropReason),
}

#[derive(Debug, Clone)]
pub struct DebounceGate {
    window: Duration,
    last_accepted: Option<Instant>,
    suppress_next: bool,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
            suppress_next: false,
        }
    }

    pub fn last_accepted(&self) -> Option<Instant> {
        self.last_accepted
    }

    pub fn is_suppressing(&self) -> bool {
        self.suppress_next
    }

    /// Drop the next event unconditionally. Called after every successful
    /// launch.
    pub fn arm_suppression(&mut self) {
        self.suppress_next = true;
    }

    /// Evaluate one event observed at `now`.
    ///
    /// Order: suppression, debounce, exclusion, kind. Only an accepted event
    /// moves the debounce timestamp.
    ///
    /// A suppressed event does not touch the debounce clock either. When a
    /// relaunch writes its own artifact as a burst of two events (create then
    /// write of `build/app` inside a watched `build/`), the first is
    /// suppressed and the second is judged against the previous accepted
    /// event, so it can trigger one more restart.
    pub fn evaluate(&mut self, now: Instant, event: &ChangeEvent, exclusions: &ExclusionSet) -> Verdict {
        if self.suppress_next {
            self.suppress_next = false;
            return Verdict::Drop(DropReason::SelfTrigger);
        }

        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                return Verdict::Drop(DropReason::Debounced);
            }
        }

        if exclusions.is_excluded(&event.path) {
            return Verdict::Drop(DropReason::Excluded);
        }

        if !event.kind.is_actionable() {
            return Verdict::Drop(DropReason::IgnoredKind);
        }

        self.last_accepted = Some(now);
        Verdict::Accept
    }
}

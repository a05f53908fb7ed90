// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - The [`WatchAdapter`] capability the supervisor consumes, with a
//!   `notify`-backed production implementation and a mock for tests.
//! - Substring-based path exclusion.
//! - The startup walk that registers every non-excluded directory.
//!
//! It does **not** know about processes; it only turns filesystem changes
//! into [`ChangeEvent`]s.

pub mod adapter;
pub mod exclusion;
pub mod mock;
pub mod walker;
pub mod watcher;

pub use adapter::{ChangeEvent, ChangeKind, WatchAdapter, WatchStreams};
pub use exclusion::{is_excluded, ExclusionSet};
pub use walker::{register_tree, WalkSummary};
pub use watcher::NotifyAdapter;

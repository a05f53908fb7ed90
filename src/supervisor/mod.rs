// src/supervisor/mod.rs

//! The restart supervisor.
//!
//! The pure gate (suppression, debounce, exclusion, kind) lives in
//! [`gate`]; the async shell that owns the process handle and drives the
//! event loop is in [`runtime`].

pub mod gate;
pub mod runtime;

pub use gate::{DebounceGate, DropReason, Verdict};
pub use runtime::{EventOutcome, Supervisor, SupervisorPhase};

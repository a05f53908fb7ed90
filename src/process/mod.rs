// src/process/mod.rs

//! Process lifecycle layer.
//!
//! - [`command`] tokenizes and classifies the command string and derives
//!   termination patterns.
//! - [`launcher`] starts the command (direct or compile-then-run).
//! - [`terminator`] stops it (graceful-then-forced, or pattern sweeps).
//! - [`proc_table`] lists live processes for pattern sweeps.
//! - [`backend`] provides the `ProcessBackend` trait the supervisor uses and
//!   the production `OsProcessBackend`.

pub mod backend;
pub mod command;
pub mod handle;
pub mod launcher;
pub mod proc_table;
pub mod terminator;

pub use backend::{BoxFuture, OsProcessBackend, ProcessBackend};
pub use command::{split_params, CommandKind, CommandSpec};
pub use handle::ProcessHandle;
pub use launcher::Launcher;
pub use proc_table::{ProcessEntry, ProcessTable};
pub use terminator::{StopSignal, Terminator};

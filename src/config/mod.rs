// src/config/mod.rs

//! Configuration for devloop.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate it (`validate.rs`).
//! - Hold the immutable runtime configuration and its builder
//!   (`supervisor.rs`).

pub mod loader;
pub mod model;
pub mod supervisor;
pub mod validate;

pub use loader::{discover, load_and_validate, load_from_path};
pub use model::{CommandSection, ConfigFile, RawConfigFile, TimingSection, WatchSection};
pub use supervisor::{SupervisorConfig, SupervisorConfigBuilder, Timing};
pub use validate::validate_config;

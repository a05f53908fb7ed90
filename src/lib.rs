// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod process;
pub mod supervisor;
pub mod watch;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::{CliArgs, RunSettings};
use crate::config::discover;
use crate::errors::DevloopError;
use crate::fs::RealFileSystem;
use crate::supervisor::Supervisor;
use crate::watch::{NotifyAdapter, WatchAdapter};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config discovery and flag merging
/// - the notify-backed watch adapter
/// - the supervisor loop
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let file = discover(&RealFileSystem, args.config.as_deref())
        .context("failed to load configuration")?;
    let settings = args.resolve(file.as_ref());

    if args.dry_run {
        return print_dry_run(&settings);
    }

    let adapter = Arc::new(NotifyAdapter::new()?);
    let config = settings
        .builder()
        .watcher(adapter.clone() as Arc<dyn WatchAdapter>)
        .build()?;

    let supervisor = Arc::new(Supervisor::new(config));
    let mut loop_task = tokio::spawn({
        let supervisor = Arc::clone(&supervisor);
        async move { supervisor.run().await }
    });

    let finished = tokio::select! {
        res = &mut loop_task => Some(res),
        _ = shutdown_signal() => None,
    };
    let joined = match finished {
        Some(res) => res,
        None => {
            info!("shutdown requested");
            adapter.exit();
            loop_task.await
        }
    };

    supervisor.stop_process().await;
    if let Err(e) = adapter.close() {
        warn!(error = %e, "failed to close watch adapter");
    }

    joined.context("supervisor task panicked")??;
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Print the effective settings; fails like a real run would on a missing
/// command.
fn print_dry_run(settings: &RunSettings) -> Result<()> {
    let command = settings.command.as_deref().ok_or_else(|| {
        DevloopError::ConfigError("a command to run is required (--cmd)".to_string())
    })?;

    println!("devloop dry-run");
    println!("  dir: {}", settings.root.display());
    println!("  cmd: {command}");
    if !settings.params.is_empty() {
        println!("  params: {:?}", settings.params);
    }
    if !settings.exclusions.is_empty() {
        println!("  exclude: {:?}", settings.exclusions.fragments());
    }
    println!(
        "  timing: debounce={:?} settle={:?} grace={:?}",
        settings.timing.debounce, settings.timing.settle, settings.timing.grace
    );

    debug!("dry-run complete (nothing watched or started)");
    Ok(())
}

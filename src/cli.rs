// src/cli.rs

//! CLI argument parsing using `clap`, and merging of flags over the
//! optional config file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::{ConfigFile, SupervisorConfigBuilder, Timing};
use crate::process::split_params;
use crate::watch::ExclusionSet;

/// Command-line arguments for `devloop`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "devloop",
    version,
    about = "Watch a directory tree and restart a command whenever a file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to monitor. Default: `.`.
    #[arg(long, value_name = "PATH")]
    pub dir: Option<PathBuf>,

    /// Command to run, e.g. `go run main.go` or `go build app main.go`.
    #[arg(long, value_name = "COMMAND")]
    pub cmd: Option<String>,

    /// Comma-separated path fragments to ignore.
    #[arg(long, value_name = "LIST")]
    pub exclude: Option<String>,

    /// Comma-separated extra arguments for the launched program.
    #[arg(long, value_name = "LIST", allow_hyphen_values = true)]
    pub params: Option<String>,

    /// Path to a config file (TOML).
    ///
    /// Without it, `Devloop.toml` in the working directory is used if present.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Minimum spacing between two restarts, in milliseconds.
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub debounce_ms: Option<u64>,

    /// Pause between stopping the old process and starting the new one.
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Time a process gets to exit after SIGTERM before SIGKILL.
    #[arg(long, value_name = "MS")]
    pub grace_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DEVLOOP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the effective settings without watching anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Effective settings after applying flags over the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub root: PathBuf,
    pub command: Option<String>,
    pub params: Vec<String>,
    pub exclusions: ExclusionSet,
    pub timing: Timing,
}

impl CliArgs {
    /// Merge flags over `file`, field by field.
    pub fn resolve(&self, file: Option<&ConfigFile>) -> RunSettings {
        let file = file.cloned().unwrap_or_default();

        let root = self
            .dir
            .clone()
            .or_else(|| file.watch.dir.as_ref().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));

        let command = self.cmd.clone().or(file.command.cmd);

        let params = match &self.params {
            Some(list) => split_params(list),
            None => file
                .command
                .params
                .into_iter()
                .filter(|p| !p.trim().is_empty())
                .collect(),
        };

        let exclusions = match &self.exclude {
            Some(list) => ExclusionSet::from_csv(list),
            None => ExclusionSet::new(file.watch.exclude),
        };

        let mut timing = Timing::default();
        let ms = Duration::from_millis;
        if let Some(v) = self.debounce_ms.or(file.timing.debounce_ms) {
            timing.debounce = ms(v);
        }
        if let Some(v) = self.settle_ms.or(file.timing.settle_ms) {
            timing.settle = ms(v);
        }
        if let Some(v) = self.grace_ms.or(file.timing.grace_ms) {
            timing.grace = ms(v);
        }

        RunSettings {
            root,
            command,
            params,
            exclusions,
            timing,
        }
    }
}

impl RunSettings {
    /// Builder pre-filled with these settings; the watcher is still missing.
    pub fn builder(&self) -> SupervisorConfigBuilder {
        let builder = crate::config::SupervisorConfig::builder()
            .root(self.root.clone())
            .params(self.params.clone())
            .exclusions(self.exclusions.clone())
            .timing(self.timing);
        match &self.command {
            Some(cmd) => builder.command(cmd.clone()),
            None => builder,
        }
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommandSection, TimingSection, WatchSection};

    fn file() -> ConfigFile {
        ConfigFile {
            watch: WatchSection {
                dir: Some("./svc".to_string()),
                exclude: vec!["node_modules".to_string()],
            },
            command: CommandSection {
                cmd: Some("go run main.go".to_string()),
                params: vec!["--port".to_string(), "8080".to_string()],
            },
            timing: TimingSection {
                debounce_ms: Some(500),
                settle_ms: None,
                grace_ms: Some(100),
            },
        }
    }

    #[test]
    fn parses_all_flags() {
        let args = CliArgs::try_parse_from([
            "devloop",
            "--dir",
            "./api",
            "--cmd",
            "go build app main.go",
            "--exclude",
            "vendor,tmp",
            "--params",
            "-v,--port,9000",
            "--debounce-ms",
            "250",
            "--log-level",
            "debug",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.dir, Some(PathBuf::from("./api")));
        assert_eq!(args.cmd.as_deref(), Some("go build app main.go"));
        assert_eq!(args.params.as_deref(), Some("-v,--port,9000"));
        assert_eq!(args.debounce_ms, Some(250));
        assert_eq!(args.log_level, Some(LogLevel::Debug));
        assert!(args.dry_run);
    }

    #[test]
    fn zero_debounce_is_rejected() {
        assert!(CliArgs::try_parse_from(["devloop", "--debounce-ms", "0"]).is_err());
    }

    #[test]
    fn defaults_without_flags_or_file() {
        let settings = CliArgs::default().resolve(None);
        assert_eq!(settings.root, PathBuf::from("."));
        assert_eq!(settings.command, None);
        assert!(settings.params.is_empty());
        assert!(settings.exclusions.is_empty());
        assert_eq!(settings.timing, Timing::default());
    }

    #[test]
    fn file_values_fill_unset_flags() {
        let settings = CliArgs::default().resolve(Some(&file()));
        assert_eq!(settings.root, PathBuf::from("./svc"));
        assert_eq!(settings.command.as_deref(), Some("go run main.go"));
        assert_eq!(settings.params, vec!["--port", "8080"]);
        assert_eq!(settings.exclusions.fragments(), &["node_modules".to_string()]);
        assert_eq!(settings.timing.debounce, Duration::from_millis(500));
        assert_eq!(settings.timing.settle, Timing::default().settle);
        assert_eq!(settings.timing.grace, Duration::from_millis(100));
    }

    #[test]
    fn flags_override_file_field_by_field() {
        let args = CliArgs {
            cmd: Some("echo hello".to_string()),
            exclude: Some("build,,".to_string()),
            settle_ms: Some(0),
            ..CliArgs::default()
        };
        let settings = args.resolve(Some(&file()));

        assert_eq!(settings.root, PathBuf::from("./svc"));
        assert_eq!(settings.command.as_deref(), Some("echo hello"));
        assert_eq!(settings.params, vec!["--port", "8080"]);
        assert_eq!(settings.exclusions.fragments(), &["build".to_string()]);
        assert_eq!(settings.timing.settle, Duration::ZERO);
        assert_eq!(settings.timing.debounce, Duration::from_millis(500));
    }
}

// src/config/model.rs

use serde::Deserialize;

/// Configuration as read from a TOML file.
///
/// ```toml
/// [watch]
/// dir = "."
/// exclude = ["node_modules", "build"]
///
/// [command]
/// cmd = "go run main.go"
/// params = ["--port", "8080"]
///
/// [timing]
/// debounce_ms = 1000
/// settle_ms = 2000
/// grace_ms = 2000
/// ```
///
/// All sections are optional; command-line flags override them field by
/// field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub command: CommandSection,

    #[serde(default)]
    pub timing: TimingSection,
}

/// Validated configuration file.
///
/// Construct with `ConfigFile::try_from(raw)` (see `validate.rs`).
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub command: CommandSection,
    pub timing: TimingSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        watch: WatchSection,
        command: CommandSection,
        timing: TimingSection,
    ) -> Self {
        Self {
            watch,
            command,
            timing,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Directory to monitor.
    pub dir: Option<String>,

    /// Path fragments excluded from monitoring and from triggering restarts.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// `[command]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommandSection {
    /// Command to run on change.
    pub cmd: Option<String>,

    /// Extra arguments appended to the launched program.
    #[serde(default)]
    pub params: Vec<String>,
}

/// `[timing]` section. Unset values fall back to the built-in defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingSection {
    pub debounce_ms: Option<u64>,
    pub settle_ms: Option<u64>,
    pub grace_ms: Option<u64>,
}

// src/process/command.rs

//! Command string tokenization and classification.

use std::path::{Path, PathBuf};

use crate::errors::LaunchError;

/// Adjacent token pair that marks a compile-then-run command.
pub const BUILD_MARKER: [&str; 2] = ["go", "build"];

/// Adjacent token pair that marks a command whose tool execs a temporary
/// binary of its own.
pub const RUN_MARKER: [&str; 2] = ["go", "run"];

/// Directory (under the monitored root) that receives compiled binaries.
pub const BUILD_DIR: &str = "build";

const BINARY_END: &str = r"(\s|$)";

/// How a command is launched and, consequently, how it is terminated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// Start the first token with the rest as arguments; terminate the
    /// spawned process itself.
    Direct,
    /// Compile `source` into `build/<binary>` with `tool`, then run the
    /// binary.
    Build {
        tool: String,
        binary: String,
        source: String,
    },
    /// Start directly, but the real process is a temporary binary the tool
    /// builds from `source`.
    ToolRun { source: String },
}

/// A parsed command string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    raw: String,
    tokens: Vec<String>,
    kind: CommandKind,
}

impl CommandSpec {
    pub fn parse(command: &str) -> Result<Self, LaunchError> {
        let tokens: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        let insufficient = || LaunchError::InsufficientArguments {
            command: command.to_string(),
        };

        if tokens.len() < 2 {
            return Err(insufficient());
        }

        let kind = if has_marker(&tokens, BUILD_MARKER) {
            // Binary name and source file are the last two operands.
            if tokens.len() < 4 {
                return Err(insufficient());
            }
            let n = tokens.len();
            CommandKind::Build {
                tool: tokens[0].clone(),
                binary: tokens[n - 2].clone(),
                source: tokens[n - 1].clone(),
            }
        } else if has_marker(&tokens, RUN_MARKER) {
            let source = tokens[tokens.len() - 1].clone();
            CommandKind::ToolRun { source }
        } else {
            CommandKind::Direct
        };

        Ok(Self {
            raw: command.trim().to_string(),
            tokens,
            kind,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn kind(&self) -> &CommandKind {
        &self.kind
    }

    pub fn program(&self) -> &str {
        &self.tokens[0]
    }

    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }

    /// Source file, for `Build` and `ToolRun` commands.
    pub fn source(&self) -> Option<&str> {
        match &self.kind {
            CommandKind::Direct => None,
            CommandKind::Build { source, .. } | CommandKind::ToolRun { source } => Some(source),
        }
    }

    /// Path of the compiled binary for `Build` commands.
    pub fn build_target(&self, root: &Path) -> Option<PathBuf> {
        match &self.kind {
            CommandKind::Build { binary, .. } => Some(root.join(BUILD_DIR).join(binary)),
            _ => None,
        }
    }

    /// Whether terminating this command requires a command-line sweep.
    pub fn uses_pattern_termination(&self) -> bool {
        !matches!(self.kind, CommandKind::Direct)
    }

    /// Regex sources matching the command lines of the processes this
    /// command ultimately runs.
    ///
    /// - the command string itself,
    /// - the tool's temporary binary (`.../go-build<id>/b001/exe/<stem>`),
    /// - for builds, the compiled binary under `build/`.
    ///
    /// Binary patterns must be followed by whitespace or the end of the
    /// command line, so `exe/main` never matches `exe/maintenance`.
    /// Direct commands yield no patterns.
    pub fn termination_patterns(&self, root: &Path) -> Vec<String> {
        let Some(source) = self.source() else {
            return Vec::new();
        };

        let mut patterns = vec![regex::escape(&self.raw)];

        let stem = Path::new(source)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.to_string());
        patterns.push(format!("go-build.*/exe/{}{BINARY_END}", regex::escape(&stem)));

        if let Some(target) = self.build_target(root) {
            patterns.push(format!(
                "{}{BINARY_END}",
                regex::escape(&target.to_string_lossy())
            ));
        }

        patterns
    }
}

fn has_marker(tokens: &[String], marker: [&str; 2]) -> bool {
    tokens
        .windows(2)
        .any(|w| w[0] == marker[0] && w[1] == marker[1])
}

/// Split a comma-separated parameter list, dropping blank entries.
pub fn split_params(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn single_token_is_insufficient() {
        let err = CommandSpec::parse("echo").unwrap_err();
        assert!(matches!(err, LaunchError::InsufficientArguments { .. }));
        assert!(CommandSpec::parse("   ").is_err());
    }

    #[test]
    fn plain_command_is_direct() {
        let spec = CommandSpec::parse("echo hello world").unwrap();
        assert_eq!(spec.kind(), &CommandKind::Direct);
        assert_eq!(spec.program(), "echo");
        assert_eq!(spec.args(), &["hello".to_string(), "world".to_string()]);
        assert!(spec.termination_patterns(Path::new(".")).is_empty());
        assert!(!spec.uses_pattern_termination());
    }

    #[test]
    fn build_command_takes_binary_and_source_from_the_tail() {
        let spec = CommandSpec::parse("go build app main.go").unwrap();
        assert_eq!(
            spec.kind(),
            &CommandKind::Build {
                tool: "go".to_string(),
                binary: "app".to_string(),
                source: "main.go".to_string(),
            }
        );
        assert_eq!(
            spec.build_target(Path::new(".")),
            Some(PathBuf::from("./build/app"))
        );
    }

    #[test]
    fn build_command_without_binary_is_insufficient() {
        assert!(matches!(
            CommandSpec::parse("go build main.go"),
            Err(LaunchError::InsufficientArguments { .. })
        ));
    }

    #[test]
    fn build_patterns_cover_command_temp_binary_and_target() {
        let spec = CommandSpec::parse("go build app main.go").unwrap();
        let patterns = spec.termination_patterns(Path::new("."));
        assert_eq!(patterns.len(), 3);

        let command = Regex::new(&patterns[0]).unwrap();
        assert!(command.is_match("go build app main.go"));
        assert!(!command.is_match("go build app mainXgo"));

        let temp = Regex::new(&patterns[1]).unwrap();
        assert!(temp.is_match("/tmp/go-build123456/b001/exe/main"));
        assert!(!temp.is_match("/tmp/go-build123456/b001/exe/other"));

        let target = Regex::new(&patterns[2]).unwrap();
        assert!(target.is_match("./build/app --port 8080"));
        assert!(target.is_match("./build/app"));
    }

    #[test]
    fn binary_patterns_stop_at_the_end_of_the_name() {
        let spec = CommandSpec::parse("go build app main.go").unwrap();
        let patterns = spec.termination_patterns(Path::new("."));

        let temp = Regex::new(&patterns[1]).unwrap();
        assert!(temp.is_match("/tmp/go-build1/b001/exe/main --port 8080"));
        assert!(!temp.is_match("/tmp/go-build1/b001/exe/maintenance"));

        let target = Regex::new(&patterns[2]).unwrap();
        assert!(!target.is_match("./build/application"));
        assert!(!target.is_match("./build/app-old --port 8080"));
    }

    #[test]
    fn tool_run_uses_patterns_but_launches_directly() {
        let spec = CommandSpec::parse("go run ./cmd/server/main.go").unwrap();
        assert_eq!(
            spec.kind(),
            &CommandKind::ToolRun {
                source: "./cmd/server/main.go".to_string()
            }
        );
        assert!(spec.uses_pattern_termination());
        let patterns = spec.termination_patterns(Path::new("."));
        assert_eq!(patterns.len(), 2);
        assert!(Regex::new(&patterns[1])
            .unwrap()
            .is_match("/var/folders/x/go-build99/b001/exe/main"));
    }

    #[test]
    fn params_drop_blank_entries() {
        assert_eq!(split_params("--port,8080, ,"), vec!["--port", "8080"]);
        assert!(split_params("").is_empty());
    }
}

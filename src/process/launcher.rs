// src/process/launcher.rs

//! Process launcher: direct launch or compile-then-run.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::errors::LaunchError;
use crate::process::command::{CommandKind, CommandSpec};
use crate::process::handle::ProcessHandle;

/// Starts the configured command relative to the monitored root.
///
/// Output of both the build step and the program goes straight to the
/// supervisor's own stdout/stderr.
#[derive(Debug, Clone)]
pub struct Launcher {
    root: PathBuf,
}

impl Launcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Parse `command` and start it.
    ///
    /// Returns once the OS has accepted the exec request; the child keeps
    /// running in the background. For build commands the compile step runs
    /// to completion first.
    pub async fn start(
        &self,
        command: &str,
        params: &[String],
    ) -> Result<ProcessHandle, LaunchError> {
        let spec = CommandSpec::parse(command)?;
        self.start_spec(&spec, params).await
    }

    pub async fn start_spec(
        &self,
        spec: &CommandSpec,
        params: &[String],
    ) -> Result<ProcessHandle, LaunchError> {
        match spec.kind() {
            CommandKind::Build {
                tool,
                binary: _,
                source,
            } => {
                let source = self.root.join(source);
                let target = spec
                    .build_target(&self.root)
                    .ok_or_else(|| LaunchError::CompileFailed {
                        reason: "build command without a target".to_string(),
                    })?;

                self.compile(tool, &source, &target).await?;

                info!(target = ?target, ?params, "running the compiled binary");
                let target_str = target.to_string_lossy().into_owned();
                let child = spawn(&target_str, &[], params)?;
                Ok(ProcessHandle::pattern(
                    child,
                    spec.termination_patterns(&self.root),
                ))
            }
            CommandKind::ToolRun { .. } => {
                info!(cmd = %spec.raw(), "running the program through its tool");
                let child = spawn(spec.program(), spec.args(), params)?;
                Ok(ProcessHandle::pattern(
                    child,
                    spec.termination_patterns(&self.root),
                ))
            }
            CommandKind::Direct => {
                info!(cmd = %spec.raw(), "running the program directly");
                let child = spawn(spec.program(), spec.args(), params)?;
                Ok(ProcessHandle::direct(child))
            }
        }
    }

    /// Run `<tool> build -o <target> <source>` to completion.
    ///
    /// There is no timeout: a hung build blocks the caller.
    async fn compile(&self, tool: &str, source: &Path, target: &Path) -> Result<(), LaunchError> {
        info!(tool, source = ?source, target = ?target, "compiling the program");

        let status = Command::new(tool)
            .arg("build")
            .arg("-o")
            .arg(target)
            .arg(source)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| LaunchError::CompileFailed {
                reason: format!("running {tool}: {e}"),
            })?;

        if !status.success() {
            return Err(LaunchError::CompileFailed {
                reason: format!("{tool} build exited with {status}"),
            });
        }

        debug!(target = ?target, "compile finished");
        Ok(())
    }
}

fn spawn(
    program: &str,
    args: &[String],
    params: &[String],
) -> Result<tokio::process::Child, LaunchError> {
    let child = Command::new(program)
        .args(args)
        .args(params)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| LaunchError::StartFailed {
            program: program.to_string(),
            source,
        })?;

    info!(program, ?args, ?params, pid = ?child.id(), "process started");
    Ok(child)
}

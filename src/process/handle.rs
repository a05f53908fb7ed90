// src/process/handle.rs

use tokio::process::Child;

/// A running child owned by the supervisor.
///
/// `Pattern` handles belong to commands whose real process is not (only)
/// the spawned child, so termination sweeps the process table using the
/// carried patterns before reaping `child`.
#[derive(Debug)]
pub enum ProcessHandle {
    Direct { child: Child },
    Pattern { child: Child, patterns: Vec<String> },
}

impl ProcessHandle {
    pub fn direct(child: Child) -> Self {
        ProcessHandle::Direct { child }
    }

    pub fn pattern(child: Child, patterns: Vec<String>) -> Self {
        ProcessHandle::Pattern { child, patterns }
    }

    /// Pid of the spawned child, `None` once it has been reaped.
    pub fn pid(&self) -> Option<u32> {
        self.child().id()
    }

    pub fn patterns(&self) -> &[String] {
        match self {
            ProcessHandle::Direct { .. } => &[],
            ProcessHandle::Pattern { patterns, .. } => patterns,
        }
    }

    pub fn child(&self) -> &Child {
        match self {
            ProcessHandle::Direct { child } | ProcessHandle::Pattern { child, .. } => child,
        }
    }

    pub fn child_mut(&mut self) -> &mut Child {
        match self {
            ProcessHandle::Direct { child } | ProcessHandle::Pattern { child, .. } => child,
        }
    }
}

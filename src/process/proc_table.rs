// src/process/proc_table.rs

//! Snapshot of live OS processes and their command lines.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::fs::{FileSystem, RealFileSystem};

/// One live process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: i32,
    /// Parent pid; 0 when unknown.
    pub ppid: i32,
    pub cmdline: String,
}

/// Reads the process table from `/proc` when available, `ps` otherwise.
///
/// Matching never returns this process, any of its ancestors, or a process
/// whose command line mentions one of the guarded names (by default the
/// running executable's file name). A shell that launched the supervisor
/// with the watched command in its arguments therefore survives a sweep.
#[derive(Debug, Clone)]
pub struct ProcessTable {
    fs: Arc<dyn FileSystem>,
    proc_root: PathBuf,
    guarded_names: Vec<String>,
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new(Arc::new(RealFileSystem), "/proc")
    }
}

impl ProcessTable {
    pub fn new(fs: Arc<dyn FileSystem>, proc_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            proc_root: proc_root.into(),
            guarded_names: current_exe_name().into_iter().collect(),
        }
    }

    /// Replace the guarded names. An empty list only keeps the ancestor guard.
    pub fn with_guarded_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.guarded_names = names
            .into_iter()
            .map(Into::into)
            .filter(|n: &String| !n.is_empty())
            .collect();
        self
    }

    pub fn guarded_names(&self) -> &[String] {
        &self.guarded_names
    }

    /// List every live process with a non-empty command line.
    pub async fn snapshot(&self) -> Result<Vec<ProcessEntry>> {
        if self.fs.is_dir(&self.proc_root) {
            let fs = Arc::clone(&self.fs);
            let root = self.proc_root.clone();
            tokio::task::spawn_blocking(move || scan_proc(fs.as_ref(), &root))
                .await
                .context("process table scan panicked")?
        } else {
            scan_ps().await
        }
    }

    /// Pids whose command line matches `pattern`, minus the protected ones.
    pub async fn find_matching(&self, pattern: &Regex) -> Result<Vec<i32>> {
        let own_pid = std::process::id() as i32;
        let entries = self.snapshot().await?;
        Ok(select_matching(&entries, own_pid, &self.guarded_names, pattern))
    }
}

fn current_exe_name() -> Option<String> {
    let exe = std::env::current_exe().ok()?;
    exe.file_name()?.to_str().map(str::to_string)
}

/// `own_pid` and every ancestor reachable through the parent links in
/// `entries`.
fn lineage(entries: &[ProcessEntry], own_pid: i32) -> HashSet<i32> {
    let parents: HashMap<i32, i32> = entries.iter().map(|e| (e.pid, e.ppid)).collect();
    let mut seen = HashSet::new();
    let mut pid = own_pid;
    while pid > 0 && seen.insert(pid) {
        match parents.get(&pid) {
            Some(&ppid) => pid = ppid,
            None => break,
        }
    }
    seen
}

fn select_matching(
    entries: &[ProcessEntry],
    own_pid: i32,
    guarded_names: &[String],
    pattern: &Regex,
) -> Vec<i32> {
    let protected = lineage(entries, own_pid);
    entries
        .iter()
        .filter(|e| pattern.is_match(&e.cmdline))
        .filter(|e| {
            if protected.contains(&e.pid) {
                debug!(pid = e.pid, "skipping own process lineage");
                return false;
            }
            if let Some(name) = guarded_names.iter().find(|n| e.cmdline.contains(n.as_str())) {
                debug!(pid = e.pid, guarded = %name, "skipping guarded process");
                return false;
            }
            true
        })
        .map(|e| e.pid)
        .collect()
}

/// Read `<root>/<pid>/cmdline` and `<root>/<pid>/stat` for each numeric
/// entry.
///
/// Processes that exit while we scan are skipped.
fn scan_proc(fs: &dyn FileSystem, root: &Path) -> Result<Vec<ProcessEntry>> {
    let mut entries = Vec::new();
    for dir in fs.read_dir(root)? {
        let Some(pid) = dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.parse::<i32>().ok())
        else {
            continue;
        };

        let raw = match fs.read_lossy(&dir.join("cmdline")) {
            Ok(raw) => raw,
            Err(err) => {
                trace!(pid, error = %err, "process vanished during scan");
                continue;
            }
        };

        let cmdline = raw
            .split('\0')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if cmdline.is_empty() {
            continue;
        }

        let ppid = fs
            .read_lossy(&dir.join("stat"))
            .ok()
            .and_then(|stat| parse_stat_ppid(&stat))
            .unwrap_or(0);
        entries.push(ProcessEntry { pid, ppid, cmdline });
    }
    Ok(entries)
}

/// Parent pid from a `/proc/<pid>/stat` line: `pid (comm) state ppid ...`.
///
/// `comm` may itself contain spaces and parentheses, so fields are counted
/// from the last `)`.
fn parse_stat_ppid(stat: &str) -> Option<i32> {
    let (_, rest) = stat.rsplit_once(')')?;
    rest.split_whitespace().nth(1)?.parse().ok()
}

async fn scan_ps() -> Result<Vec<ProcessEntry>> {
    let output = Command::new("ps")
        .args(["-axww", "-o", "pid=,ppid=,command="])
        .output()
        .await
        .context("running ps")?;

    if !output.status.success() {
        anyhow::bail!("ps exited with {}", output.status);
    }

    Ok(parse_ps_output(&String::from_utf8_lossy(&output.stdout)))
}

fn parse_ps_output(text: &str) -> Vec<ProcessEntry> {
    text.lines()
        .filter_map(|line| {
            let (pid, rest) = line.trim_start().split_once(char::is_whitespace)?;
            let (ppid, cmdline) = rest.trim_start().split_once(char::is_whitespace)?;
            let pid = pid.parse::<i32>().ok()?;
            let ppid = ppid.parse::<i32>().ok()?;
            let cmdline = cmdline.trim();
            (!cmdline.is_empty()).then(|| ProcessEntry {
                pid,
                ppid,
                cmdline: cmdline.to_string(),
            })
        })
        .collect()
}

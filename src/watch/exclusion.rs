// src/watch/exclusion.rs

//! Path exclusion by substring fragments.
//!
//! A path is excluded when its string form contains any configured fragment
//! anywhere, not only as a whole path segment. A single `node_modules` entry
//! therefore excludes every nested `node_modules` tree, but it also excludes
//! unrelated paths that merely contain the same text (`my_node_modules.txt`).

use std::path::Path;

/// Read-only set of exclusion fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    fragments: Vec<String>,
}

impl ExclusionSet {
    /// Build a set from fragments; blank entries are dropped since an empty
    /// fragment would match every path.
    pub fn new<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for f in fragments {
            let f = f.into().trim().to_string();
            if !f.is_empty() && !out.contains(&f) {
                out.push(f);
            }
        }
        Self { fragments: out }
    }

    /// Parse a comma-separated list, as given on the command line.
    pub fn from_csv(list: &str) -> Self {
        Self::new(list.split(','))
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        is_excluded(path, self)
    }
}

pub fn is_excluded(path: &Path, set: &ExclusionSet) -> bool {
    let path = path.to_string_lossy();
    set.fragments.iter().any(|f| path.contains(f.as_str()))
}

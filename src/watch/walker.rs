// src/watch/walker.rs

//! Startup walk that registers every non-excluded directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::{DevloopError, Result};
use crate::fs::FileSystem;
use crate::watch::adapter::WatchAdapter;
use crate::watch::exclusion::ExclusionSet;

/// What the startup walk did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Directories successfully registered with the adapter.
    pub registered: Vec<PathBuf>,
    /// Directories skipped because they matched an exclusion fragment.
    pub excluded: Vec<PathBuf>,
    /// Directories the adapter refused to register.
    pub failed: Vec<PathBuf>,
}

/// Walk `root` and register each directory that is not excluded.
///
/// Excluded directories are not descended into: with substring matching
/// every descendant path contains the same fragment. Symlinks are not
/// followed. A registration failure is logged and the whole subtree is
/// skipped without listing it, since it may have vanished after its parent
/// was listed. Any other listing failure aborts the walk.
pub fn register_tree(
    fs: &dyn FileSystem,
    root: &Path,
    exclusions: &ExclusionSet,
    adapter: &dyn WatchAdapter,
) -> Result<WalkSummary> {
    if !fs.is_dir(root) {
        return Err(DevloopError::Startup {
            path: root.to_path_buf(),
            source: anyhow::anyhow!("monitored root is not a directory"),
        });
    }

    let mut summary = WalkSummary::default();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        if exclusions.is_excluded(&dir) {
            debug!(path = ?dir, "skipping excluded directory");
            summary.excluded.push(dir);
            continue;
        }

        match adapter.add(&dir) {
            Ok(()) => {
                debug!(path = ?dir, "watching directory");
                summary.registered.push(dir.clone());
            }
            Err(err) => {
                warn!(path = ?dir, error = %err, "failed to watch directory; skipping subtree");
                summary.failed.push(dir);
                continue;
            }
        }

        let children = fs.read_dir(&dir).map_err(|source| DevloopError::Startup {
            path: dir.clone(),
            source,
        })?;

        // Reverse so the stack pops children in listing order.
        for child in children.into_iter().rev() {
            if fs.is_dir(&child) && !fs.is_symlink(&child) {
                stack.push(child);
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::watch::mock::MockWatchAdapter;

    fn project() -> MockFileSystem {
        let fs = MockFileSystem::new();
        fs.add_file("./main.go", "package main");
        fs.add_file("./pkg/util/util.go", "package util");
        fs.add_file("./node_modules/left-pad/index.js", "");
        fs.add_file("./web/node_modules/react/index.js", "");
        fs.add_file("./web/app.js", "");
        fs
    }

    #[test]
    fn registers_every_non_excluded_directory() {
        let fs = project();
        let adapter = MockWatchAdapter::new();
        let exclusions = ExclusionSet::new(["node_modules"]);

        let summary = register_tree(&fs, Path::new("."), &exclusions, &adapter).unwrap();

        assert_eq!(
            adapter.watched(),
            vec![
                PathBuf::from("."),
                PathBuf::from("./pkg"),
                PathBuf::from("./pkg/util"),
                PathBuf::from("./web"),
            ]
        );
        assert_eq!(
            summary.excluded,
            vec![
                PathBuf::from("./node_modules"),
                PathBuf::from("./web/node_modules"),
            ]
        );
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn registration_failures_are_skipped() {
        let fs = project();
        let adapter = MockWatchAdapter::new();
        adapter.reject_path("./pkg/util");

        let summary =
            register_tree(&fs, Path::new("."), &ExclusionSet::default(), &adapter).unwrap();

        assert_eq!(summary.failed, vec![PathBuf::from("./pkg/util")]);
        assert!(summary.registered.contains(&PathBuf::from("./pkg")));
        assert!(!adapter.watched().contains(&PathBuf::from("./pkg/util")));
    }

    #[test]
    fn vanished_directory_is_skipped_not_fatal() {
        let fs = project();
        fs.fail_read_dir("./pkg/util");
        let adapter = MockWatchAdapter::new();
        adapter.reject_path("./pkg/util");

        let summary =
            register_tree(&fs, Path::new("."), &ExclusionSet::default(), &adapter).unwrap();

        assert_eq!(summary.failed, vec![PathBuf::from("./pkg/util")]);
        assert!(summary.registered.contains(&PathBuf::from("./pkg")));
    }

    #[test]
    fn listing_failure_aborts_the_walk() {
        let fs = project();
        fs.fail_read_dir("./private");
        let adapter = MockWatchAdapter::new();

        let err = register_tree(&fs, Path::new("."), &ExclusionSet::default(), &adapter)
            .unwrap_err();

        match err {
            DevloopError::Startup { path, .. } => assert_eq!(path, PathBuf::from("./private")),
            other => panic!("expected Startup error, got {other:?}"),
        }
    }

    #[test]
    fn missing_root_is_fatal() {
        let fs = MockFileSystem::new();
        let adapter = MockWatchAdapter::new();

        let result = register_tree(&fs, Path::new("./nope"), &ExclusionSet::default(), &adapter);
        assert!(matches!(result, Err(DevloopError::Startup { .. })));
        assert!(adapter.watched().is_empty());
    }
}

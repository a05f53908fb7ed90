// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

/// In-memory filesystem for walker, process-table and config tests.
///
/// Directories listed through [`MockFileSystem::fail_read_dir`] return an
/// error from `read_dir`, which lets tests exercise fatal walk errors.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
    unreadable: Arc<Mutex<HashSet<PathBuf>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        entries.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            entries: Arc::new(Mutex::new(entries)),
            unreadable: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let path = path.as_ref().to_path_buf();
        let mut entries = self.lock();
        if let Some(parent) = parent_of(&path) {
            ensure_dir(&mut entries, &parent);
            link_child(&mut entries, &parent, &path);
        }
        entries.insert(path, MockEntry::File(content.into()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.lock();
        ensure_dir(&mut entries, path.as_ref());
    }

    /// Make `read_dir` fail for this directory.
    pub fn fail_read_dir(&self, path: impl AsRef<Path>) {
        self.add_dir(path.as_ref());
        let mut unreadable = self.unreadable.lock().unwrap();
        unreadable.insert(path.as_ref().to_path_buf());
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        self.entries.lock().unwrap()
    }
}

fn parent_of(path: &Path) -> Option<PathBuf> {
    path.parent().map(|p| {
        if p.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            p.to_path_buf()
        }
    })
}

fn ensure_dir(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if entries.contains_key(path) {
        return;
    }
    entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = parent_of(path) {
        if parent != path {
            ensure_dir(entries, &parent);
            link_child(entries, &parent, path);
        }
    }
}

fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    let Some(name) = child.file_name().and_then(|n| n.to_str()) else {
        return;
    };
    if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
        if !children.iter().any(|c| c == name) {
            children.push(name.to_string());
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let entries = self.lock();
        match entries.get(path) {
            Some(MockEntry::File(content)) => {
                String::from_utf8(content.clone()).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
            }
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let entries = self.lock();
        match entries.get(path) {
            Some(MockEntry::File(content)) => Ok(Box::new(Cursor::new(content.clone()))),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir(_)))
    }

    fn is_symlink(&self, _path: &Path) -> bool {
        false
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        if self.unreadable.lock().unwrap().contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let entries = self.lock();
        match entries.get(path) {
            Some(MockEntry::Dir(children)) => {
                let mut out: Vec<PathBuf> = children.iter().map(|name| path.join(name)).collect();
                out.sort();
                Ok(out)
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_files_create_parent_directories() {
        let fs = MockFileSystem::new();
        fs.add_file("./src/bin/main.go", "package main");

        assert!(fs.is_dir(Path::new("./src")));
        assert!(fs.is_dir(Path::new("./src/bin")));
        assert_eq!(
            fs.read_dir(Path::new(".")).unwrap(),
            vec![PathBuf::from("./src")]
        );
    }

    #[test]
    fn unreadable_directory_fails_listing() {
        let fs = MockFileSystem::new();
        fs.fail_read_dir("./secret");
        assert!(fs.is_dir(Path::new("./secret")));
        assert!(fs.read_dir(Path::new("./secret")).is_err());
    }
}

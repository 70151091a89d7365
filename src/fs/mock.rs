// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    /// A file that gains one byte every time its size is read, like a file
    /// another process keeps appending to.
    Growing(Vec<u8>),
    /// A file that grows a fixed number of times and then keeps its size,
    /// like a write that finishes after a few flushes.
    Settling { content: Vec<u8>, remaining: usize },
    Dir(Vec<String>), // List of child names
    Symlink(PathBuf),
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    unreadable: HashSet<PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

fn parent_or_dot(path: &Path) -> Option<&Path> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }
    })
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        // Ensure root exists
        state
            .entries
            .insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        self.insert(path.as_ref(), MockEntry::File(content.into()));
    }

    pub fn add_growing_file(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Growing(Vec::new()));
    }

    /// A file that gains one byte on each of the next `growths` size reads.
    pub fn add_settling_file(
        &self,
        path: impl AsRef<Path>,
        content: impl Into<Vec<u8>>,
        growths: usize,
    ) {
        let entry = MockEntry::Settling {
            content: content.into(),
            remaining: growths,
        };
        self.insert(path.as_ref(), entry);
    }

    pub fn add_symlink(&self, path: impl AsRef<Path>, target: impl AsRef<Path>) {
        self.insert(path.as_ref(), MockEntry::Symlink(target.as_ref().to_path_buf()));
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        Self::ensure_dir_entry(&mut state.entries, path.as_ref());
    }

    /// Make `read_dir` fail for this directory, as if permissions were denied.
    pub fn deny_read(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.unreadable.insert(path.as_ref().to_path_buf());
    }

    /// Remove a path and everything below it.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut state = self.state.lock().unwrap();
        state.entries.retain(|p, _| !p.starts_with(path));

        if let Some(parent) = parent_or_dot(path) {
            if let Some(MockEntry::Dir(children)) = state.entries.get_mut(parent) {
                if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                    children.retain(|child| child != name);
                }
            }
        }
    }

    fn insert(&self, path: &Path, entry: MockEntry) {
        let path = path.to_path_buf();
        let mut state = self.state.lock().unwrap();
        state.entries.insert(path.clone(), entry);

        // Ensure parent directories exist implicitly for simplicity in this mock
        if let Some(parent) = parent_or_dot(&path) {
            Self::ensure_dir_entry(&mut state.entries, parent);
            Self::link_child(&mut state.entries, parent, &path);
        }
    }

    fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, path: &Path) {
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.contains(&name.to_string()) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if !entries.contains_key(path) {
            entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
            if let Some(parent) = parent_or_dot(path) {
                if parent != path {
                    // Avoid infinite loop at root
                    Self::ensure_dir_entry(entries, parent);
                    Self::link_child(entries, parent, path);
                }
            }
        }
    }
}

impl MockState {
    /// Follow symlinks until a non-link entry (bounded, like ELOOP).
    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        let mut current = path.to_path_buf();
        for _ in 0..40 {
            match self.entries.get(&current) {
                Some(MockEntry::Symlink(target)) => current = target.clone(),
                Some(_) => return Ok(current),
                None => return Err(anyhow!("File not found: {:?}", path)),
            }
        }
        Err(anyhow!("Too many levels of symbolic links: {:?}", path))
    }
}

impl FileSystem for MockFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let state = self.state.lock().unwrap();
        let path = state.resolve(path)?;
        match state.entries.get(&path) {
            Some(MockEntry::File(content))
            | Some(MockEntry::Growing(content))
            | Some(MockEntry::Settling { content, .. }) => {
                Ok(Box::new(Cursor::new(content.clone())))
            }
            _ => Err(anyhow!("Is a directory: {:?}", path)),
        }
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let path = state.resolve(path)?;
        match state.entries.get_mut(&path) {
            Some(MockEntry::File(content)) => Ok(content.len() as u64),
            Some(MockEntry::Growing(content)) => {
                content.push(b'.');
                Ok(content.len() as u64)
            }
            Some(MockEntry::Settling { content, remaining }) => {
                if *remaining > 0 {
                    *remaining -= 1;
                    content.push(b'.');
                }
                Ok(content.len() as u64)
            }
            // Directory sizes are irrelevant to the pipeline; report zero.
            _ => Ok(0),
        }
    }

    fn is_dir(&self, path: &Path) -> Result<bool> {
        let state = self.state.lock().unwrap();
        // Symlinks are reported as themselves, never as their target.
        match state.entries.get(path) {
            Some(MockEntry::Dir(_)) => Ok(true),
            Some(_) => Ok(false),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Paths in the mock are already absolute; only links need resolving.
        let state = self.state.lock().unwrap();
        state.resolve(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        if state.unreadable.contains(path) {
            return Err(anyhow!("Permission denied: {:?}", path));
        }
        let target = state.resolve(path)?;
        match state.entries.get(&target) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }
}

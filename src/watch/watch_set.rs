// src/watch/watch_set.rs

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::errors::{Result, WatchfError};
use crate::fs::FileSystem;
use crate::types::{RawEvent, RawEventKind};
use crate::watch::fingerprint::FingerprintCache;
use crate::watch::source::EventSource;

/// How registration failures are treated while walking a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkMode {
    /// Initial walk: failing to register a readable directory aborts startup.
    Startup,
    /// Directory appeared while running: failures are logged and skipped.
    Runtime,
}

/// Directories currently registered with the notification source.
///
/// Owned by the consumer loop. Every registered directory has an entry here
/// and every entry is registered.
#[derive(Debug, Default)]
pub struct WatchSet {
    dirs: BTreeSet<PathBuf>,
    recursive: bool,
    generation: u64,
}

impl WatchSet {
    pub fn new(recursive: bool) -> Self {
        Self {
            dirs: BTreeSet::new(),
            recursive,
            generation: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    /// Bumped on every membership change.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether `path` is a watched directory. Directories are never
    /// fingerprinted.
    pub fn is_watched_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    /// Register `root` (and, in recursive mode, every directory below it).
    ///
    /// Unreadable subdirectories are logged and skipped along with their
    /// subtree. An unreadable root is an error.
    pub fn bootstrap(
        &mut self,
        fs: &dyn FileSystem,
        source: &mut dyn EventSource,
        root: &Path,
    ) -> Result<()> {
        if !self.recursive {
            fs.read_dir(root).map_err(|err| WatchfError::InvalidRoot {
                path: root.to_path_buf(),
                reason: format!("{err:#}"),
            })?;
            source.watch(root)?;
            self.insert(root);
            info!(?root, "watching (non-recursive)");
            return Ok(());
        }

        let registered = self.register_tree(fs, source, root, WalkMode::Startup)?;
        info!(?root, directories = registered, "watching (recursive)");
        Ok(())
    }

    /// Bring the set in line with a structural change, before the event is
    /// filtered.
    ///
    /// - Create of a directory (recursive mode): register it and whatever
    ///   directories it already contains.
    /// - Rename/Delete of a watched directory: unregister it and its nested
    ///   directories, and purge cached fingerprints below it.
    /// - Rename/Delete of anything else: drop its cached fingerprint.
    pub fn sync(
        &mut self,
        event: &RawEvent,
        fs: &dyn FileSystem,
        source: &mut dyn EventSource,
        cache: &mut FingerprintCache,
    ) {
        let path = &event.path;
        match event.kind {
            RawEventKind::Create => match fs.is_dir(path) {
                Ok(true) if self.recursive => {
                    if let Err(err) = self.register_tree(fs, source, path, WalkMode::Runtime) {
                        warn!(?path, error = %err, "failed to watch new directory");
                    }
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(?path, error = %err, "cannot stat created path; not watching it");
                }
            },
            RawEventKind::Rename | RawEventKind::Delete => {
                if self.is_watched_dir(path) {
                    self.remove_tree(source, path);
                    cache.purge_dir(path);
                } else {
                    cache.remove(path);
                }
            }
            RawEventKind::Modify | RawEventKind::AttributeChange => {}
        }
    }

    fn insert(&mut self, dir: &Path) {
        if self.dirs.insert(dir.to_path_buf()) {
            self.generation += 1;
        }
    }

    fn register_tree(
        &mut self,
        fs: &dyn FileSystem,
        source: &mut dyn EventSource,
        top: &Path,
        mode: WalkMode,
    ) -> Result<usize> {
        let mut registered = 0;
        let mut stack = vec![top.to_path_buf()];

        while let Some(dir) = stack.pop() {
            if self.dirs.contains(&dir) {
                continue;
            }

            let children = match fs.read_dir(&dir) {
                Ok(children) => children,
                Err(err) if dir == top && mode == WalkMode::Startup => {
                    return Err(WatchfError::InvalidRoot {
                        path: dir,
                        reason: format!("{err:#}"),
                    });
                }
                Err(err) => {
                    warn!(?dir, error = %err, "skipping unreadable directory");
                    continue;
                }
            };

            match source.watch(&dir) {
                Ok(()) => {}
                Err(err) if mode == WalkMode::Runtime => {
                    warn!(?dir, error = %err, "failed to watch directory; skipping");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
            debug!(?dir, "watching");
            self.insert(&dir);
            registered += 1;

            // `is_dir` does not follow links, so a symlinked directory is
            // never descended into.
            for child in children {
                match fs.is_dir(&child) {
                    Ok(true) => stack.push(child),
                    Ok(false) => {}
                    // Raced with a delete; the delete event will follow.
                    Err(err) => debug!(path = ?child, error = %err, "entry vanished during walk"),
                }
            }
        }

        Ok(registered)
    }

    fn remove_tree(&mut self, source: &mut dyn EventSource, dir: &Path) {
        let doomed: Vec<PathBuf> = self
            .dirs
            .iter()
            .filter(|member| member.starts_with(dir))
            .cloned()
            .collect();

        for member in doomed {
            // The OS usually drops the registration of a deleted directory
            // on its own, so a failing unwatch is expected here.
            if let Err(err) = source.unwatch(&member) {
                debug!(dir = ?member, error = %err, "unwatch failed");
            }
            self.dirs.remove(&member);
            self.generation += 1;
            debug!(dir = ?member, "stopped watching");
        }
    }
}

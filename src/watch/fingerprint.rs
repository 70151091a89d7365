// src/watch/fingerprint.rs

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crc32fast::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Size and checksum of a file's content as last observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub size: u64,
    pub checksum: u32,
}

/// CRC-32 over the full contents of a file.
pub fn compute_checksum(fs: &dyn FileSystem, path: &Path) -> Result<u32> {
    let mut hasher = Hasher::new();
    let mut file = fs.open_read(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("reading {:?} for checksum", path))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

/// Current size and checksum of a file.
pub fn fingerprint_file(fs: &dyn FileSystem, path: &Path) -> Result<Fingerprint> {
    let size = fs.file_size(path)?;
    let checksum = compute_checksum(fs, path)?;
    debug!(?path, size, checksum, "computed fingerprint");
    Ok(Fingerprint { size, checksum })
}

/// Per-path fingerprints of files seen since the watch started.
///
/// Entries are only ever added by [`FingerprintCache::observe`]; there is no
/// pre-population, so the first sighting of a file always counts as a change.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    entries: HashMap<PathBuf, Fingerprint>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &Path) -> Option<&Fingerprint> {
        self.entries.get(path)
    }

    /// Record the latest fingerprint for `path` and report whether the
    /// content changed.
    ///
    /// Size and checksum are compared independently and whichever differs is
    /// updated.
    pub fn observe(&mut self, path: &Path, current: Fingerprint) -> bool {
        let Some(cached) = self.entries.get_mut(path) else {
            self.entries.insert(path.to_path_buf(), current);
            return true;
        };

        let mut changed = false;
        if cached.size != current.size {
            cached.size = current.size;
            changed = true;
        }
        if cached.checksum != current.checksum {
            cached.checksum = current.checksum;
            changed = true;
        }
        changed
    }

    /// Forget a single file.
    pub fn remove(&mut self, path: &Path) -> bool {
        let removed = self.entries.remove(path).is_some();
        if removed {
            debug!(?path, "invalidated fingerprint");
        }
        removed
    }

    /// Forget every file below `dir`. Returns how many entries were dropped.
    pub fn purge_dir(&mut self, dir: &Path) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|path, _| !(path.starts_with(dir) && path != dir));
        let purged = before - self.entries.len();
        if purged > 0 {
            debug!(?dir, purged, "purged fingerprints below directory");
        }
        purged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn fp(size: u64, checksum: u32) -> Fingerprint {
        Fingerprint { size, checksum }
    }

    #[test]
    fn first_sighting_counts_as_changed() {
        let mut cache = FingerprintCache::new();
        assert!(cache.observe(Path::new("/w/a.txt"), fp(3, 7)));
        assert!(!cache.observe(Path::new("/w/a.txt"), fp(3, 7)));
    }

    #[test]
    fn size_and_checksum_are_updated_independently() {
        let mut cache = FingerprintCache::new();
        let path = Path::new("/w/a.txt");
        cache.observe(path, fp(3, 7));

        assert!(cache.observe(path, fp(3, 8)));
        assert_eq!(cache.get(path), Some(&fp(3, 8)));

        assert!(cache.observe(path, fp(4, 8)));
        assert_eq!(cache.get(path), Some(&fp(4, 8)));
    }

    #[test]
    fn purge_dir_only_touches_paths_below_the_directory() {
        let mut cache = FingerprintCache::new();
        cache.observe(Path::new("/w/sub/a.txt"), fp(1, 1));
        cache.observe(Path::new("/w/sub/deep/b.txt"), fp(1, 1));
        cache.observe(Path::new("/w/subway.txt"), fp(1, 1));
        cache.observe(Path::new("/w/other/c.txt"), fp(1, 1));

        assert_eq!(cache.purge_dir(Path::new("/w/sub")), 2);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(Path::new("/w/subway.txt")).is_some());
        assert!(cache.get(Path::new("/w/other/c.txt")).is_some());
    }

    #[test]
    fn checksum_follows_content() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/a.txt", b"hello".to_vec());
        let first = fingerprint_file(&fs, Path::new("/w/a.txt")).unwrap();
        assert_eq!(first.size, 5);
        assert_eq!(first.checksum, crc32fast::hash(b"hello"));

        fs.add_file("/w/a.txt", b"jello".to_vec());
        let second = fingerprint_file(&fs, Path::new("/w/a.txt")).unwrap();
        assert_eq!(second.size, first.size);
        assert_ne!(second.checksum, first.checksum);
    }

    #[test]
    fn missing_file_is_an_error() {
        let fs = MockFileSystem::new();
        assert!(fingerprint_file(&fs, Path::new("/nope")).is_err());
    }
}

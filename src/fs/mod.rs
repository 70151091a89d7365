// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod mock;

/// Abstract filesystem interface.
///
/// Everything the pipeline needs to know about the disk goes through here:
/// directory walks, "is this a directory", file sizes while waiting for a
/// write to settle, and file contents for checksumming.
pub trait FileSystem: Send + Sync + Debug {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>>;

    /// Current size of the file in bytes.
    fn file_size(&self, path: &Path) -> Result<u64>;

    /// Stat the path without following symlinks, so a link to a directory
    /// is not a directory. Errors if the path cannot be stat'ed at all.
    fn is_dir(&self, path: &Path) -> Result<bool>;

    fn canonicalize(&self, path: &Path) -> Result<PathBuf>;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn open_read(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let file = fs::File::open(path).with_context(|| format!("opening file {:?}", path))?;
        Ok(Box::new(file))
    }

    fn file_size(&self, path: &Path) -> Result<u64> {
        let meta = fs::metadata(path).with_context(|| format!("reading size of {:?}", path))?;
        Ok(meta.len())
    }

    fn is_dir(&self, path: &Path) -> Result<bool> {
        let meta = fs::symlink_metadata(path).with_context(|| format!("lstat {:?}", path))?;
        Ok(meta.file_type().is_dir())
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).with_context(|| format!("canonicalizing {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn directory_symlink_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real");
        let link = dir.path().join("link");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let fs = RealFileSystem;
        assert!(fs.is_dir(&real).unwrap());
        assert!(!fs.is_dir(&link).unwrap());
        assert_eq!(fs.read_dir(&link).unwrap().len(), 0);
    }
}

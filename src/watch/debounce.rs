// src/watch/debounce.rs

//! Content-change debouncing.
//!
//! Editors and compilers often write a file in several bursts, each of which
//! produces a modify notification. Before deciding anything we wait until the
//! file's size stops moving, then compare its fingerprint with the last one we
//! saw.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::fs::FileSystem;
use crate::watch::fingerprint::{fingerprint_file, FingerprintCache};

/// Interval between two size readings.
pub const STABLE_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Consecutive unchanged size readings after which a file counts as closed.
pub const STABLE_POLL_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizeSettings {
    pub poll_interval: Duration,
    pub threshold: u32,
    /// `None` keeps polling for as long as the size keeps changing.
    pub max_wait: Option<Duration>,
}

impl Default for StabilizeSettings {
    fn default() -> Self {
        Self {
            poll_interval: STABLE_POLL_INTERVAL,
            threshold: STABLE_POLL_THRESHOLD,
            max_wait: None,
        }
    }
}

impl StabilizeSettings {
    pub fn with_max_wait(max_wait: Option<Duration>) -> Self {
        Self {
            max_wait,
            ..Self::default()
        }
    }
}

/// Poll the size of `path` until it has been the same for
/// `settings.threshold` consecutive readings. Returns the settled size.
///
/// The reading before the first poll counts as zero, so an empty file is
/// stable after `threshold` polls.
pub async fn wait_until_stable(
    fs: &dyn FileSystem,
    path: &Path,
    settings: &StabilizeSettings,
) -> Result<u64> {
    debug!(?path, "waiting for file to settle");
    let started = Instant::now();
    let mut last_size = 0u64;
    let mut unchanged = 0u32;

    loop {
        let size = fs
            .file_size(path)
            .with_context(|| format!("waiting for {:?} to settle", path))?;

        if size == last_size {
            unchanged += 1;
            if unchanged >= settings.threshold {
                return Ok(size);
            }
        } else {
            unchanged = 0;
        }
        last_size = size;

        if let Some(max_wait) = settings.max_wait {
            if started.elapsed() >= max_wait {
                return Err(anyhow!(
                    "{:?} was still changing size after {:?}",
                    path,
                    max_wait
                ));
            }
        }

        sleep(settings.poll_interval).await;
    }
}

/// Decide whether a modify event on `path` reflects a real content change.
///
/// Fails closed: any error while waiting, sizing or checksumming is logged
/// and reported as "unchanged".
pub async fn content_changed(
    fs: &Arc<dyn FileSystem>,
    cache: &mut FingerprintCache,
    path: &Path,
    settings: &StabilizeSettings,
) -> bool {
    if let Err(err) = wait_until_stable(fs.as_ref(), path, settings).await {
        warn!(?path, error = %err, "file did not settle; ignoring event");
        return false;
    }

    // Checksumming reads the whole file; keep it off the async workers.
    let fingerprint = {
        let fs = Arc::clone(fs);
        let owned = path.to_path_buf();
        match tokio::task::spawn_blocking(move || fingerprint_file(fs.as_ref(), &owned)).await {
            Ok(Ok(fingerprint)) => fingerprint,
            Ok(Err(err)) => {
                warn!(?path, error = %err, "failed to fingerprint file; ignoring event");
                return false;
            }
            Err(err) => {
                warn!(?path, error = %err, "fingerprint task failed; ignoring event");
                return false;
            }
        }
    };

    let changed = cache.observe(path, fingerprint);
    debug!(?path, changed, "content check finished");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn fast(max_wait: Option<Duration>) -> StabilizeSettings {
        StabilizeSettings {
            poll_interval: Duration::from_millis(1),
            threshold: STABLE_POLL_THRESHOLD,
            max_wait,
        }
    }

    #[tokio::test]
    async fn stable_file_settles_after_threshold_polls() {
        let fs = MockFileSystem::new();
        fs.add_file("/w/a.txt", b"abc".to_vec());
        let size = wait_until_stable(&fs, Path::new("/w/a.txt"), &fast(None))
            .await
            .unwrap();
        assert_eq!(size, 3);
    }

    #[tokio::test]
    async fn file_that_stops_growing_settles_at_its_final_size() {
        let fs = MockFileSystem::new();
        fs.add_settling_file("/w/out.bin", b"ab".to_vec(), 3);
        let size = wait_until_stable(&fs, Path::new("/w/out.bin"), &fast(None))
            .await
            .unwrap();
        assert_eq!(size, 5);
    }

    #[tokio::test]
    async fn vanished_file_aborts_the_wait() {
        let fs = MockFileSystem::new();
        assert!(wait_until_stable(&fs, Path::new("/w/gone.txt"), &fast(None))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn ever_growing_file_hits_the_max_wait() {
        let fs = MockFileSystem::new();
        fs.add_growing_file("/w/log.txt");
        let res = wait_until_stable(
            &fs,
            Path::new("/w/log.txt"),
            &fast(Some(Duration::from_millis(30))),
        )
        .await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn same_content_is_changed_once_then_unchanged() {
        let mock = MockFileSystem::new();
        mock.add_file("/w/a.txt", b"hello".to_vec());
        let fs: Arc<dyn FileSystem> = Arc::new(mock);
        let mut cache = FingerprintCache::new();
        let path = Path::new("/w/a.txt");

        assert!(content_changed(&fs, &mut cache, path, &fast(None)).await);
        assert!(!content_changed(&fs, &mut cache, path, &fast(None)).await);
    }

    #[tokio::test]
    async fn unreadable_file_fails_closed_without_caching() {
        let fs: Arc<dyn FileSystem> = Arc::new(MockFileSystem::new());
        let mut cache = FingerprintCache::new();
        assert!(!content_changed(&fs, &mut cache, Path::new("/w/missing"), &fast(None)).await);
        assert!(cache.is_empty());
    }
}

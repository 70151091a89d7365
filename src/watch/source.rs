// src/watch/source.rs

use std::path::Path;

use anyhow::Result;

/// Registration side of the OS notification source.
///
/// Registrations are single-level: watching a directory reports changes to
/// its direct entries only. Recursion is handled by the [`WatchSet`], which
/// registers every directory of the tree on its own.
///
/// [`WatchSet`]: crate::watch::watch_set::WatchSet
pub trait EventSource: Send {
    fn watch(&mut self, dir: &Path) -> Result<()>;
    fn unwatch(&mut self, dir: &Path) -> Result<()>;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        (**self).watch(dir)
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        (**self).unwatch(dir)
    }
}

// src/watch/watcher.rs

use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::{RawEvent, RawEventKind};
use crate::watch::source::EventSource;

/// Capacity of the queue between the notify callback and the consumer loop.
///
/// Large enough that the producer practically never blocks.
pub const EVENT_QUEUE_CAPACITY: usize = 1024 * 1024;

/// Translate one notify event into per-path raw events.
///
/// An entry moved into a watched directory shows up as a create, an entry
/// moved away as a rename. Backends that pair both halves of a rename also
/// deliver the halves individually, so the paired event is skipped.
pub fn raw_events_from(event: Event) -> Vec<RawEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => RawEventKind::Create,
        EventKind::Modify(ModifyKind::Metadata(_)) => RawEventKind::AttributeChange,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => RawEventKind::Create,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => return Vec::new(),
        EventKind::Modify(ModifyKind::Name(_)) => RawEventKind::Rename,
        EventKind::Modify(_) => RawEventKind::Modify,
        EventKind::Remove(_) => RawEventKind::Delete,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| RawEvent::new(path, kind))
        .collect()
}

/// Handle to the notify watcher.
///
/// The notify callback is the producer: it pushes raw events into the queue
/// from notify's own thread. The consumer registers and unregisters
/// directories through this handle while events keep flowing; [`close`]
/// drops the watcher, which ends the producer and closes the queue.
///
/// [`close`]: NotifySource::close
#[derive(Clone)]
pub struct NotifySource {
    inner: Arc<Mutex<Option<RecommendedWatcher>>>,
}

impl std::fmt::Debug for NotifySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifySource").finish_non_exhaustive()
    }
}

impl NotifySource {
    /// Create the watcher and wire its callback to `queue`.
    pub fn spawn(queue: mpsc::Sender<RawEvent>) -> notify::Result<Self> {
        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for raw in raw_events_from(event) {
                        if queue.blocking_send(raw).is_err() {
                            debug!("event queue closed; dropping notification");
                            return;
                        }
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Some(watcher))),
        })
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    /// Drop the underlying watcher. Returns `false` if it was already closed.
    pub fn close(&self) -> Result<bool> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("notification source lock poisoned"))?;
        Ok(guard.take().is_some())
    }

    fn with_watcher<T>(
        &self,
        f: impl FnOnce(&mut RecommendedWatcher) -> notify::Result<T>,
    ) -> Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| anyhow!("notification source lock poisoned"))?;
        let watcher = guard
            .as_mut()
            .ok_or_else(|| anyhow!("notification source is closed"))?;
        Ok(f(watcher)?)
    }
}

impl EventSource for NotifySource {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        self.with_watcher(|w| w.watch(dir, RecursiveMode::NonRecursive))
    }

    fn unwatch(&mut self, dir: &Path) -> Result<()> {
        self.with_watcher(|w| w.unwatch(dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind, RemoveKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut ev = Event::new(kind);
        for p in paths {
            ev = ev.add_path(PathBuf::from(p));
        }
        ev
    }

    fn kinds(ev: Event) -> Vec<RawEventKind> {
        raw_events_from(ev).into_iter().map(|r| r.kind).collect()
    }

    #[test]
    fn content_and_metadata_changes_are_told_apart() {
        let data = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/w/a"],
        );
        let meta = event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/w/a"],
        );
        assert_eq!(kinds(data), vec![RawEventKind::Modify]);
        assert_eq!(kinds(meta), vec![RawEventKind::AttributeChange]);
    }

    #[test]
    fn rename_halves_map_to_rename_and_create() {
        let from = event(EventKind::Modify(ModifyKind::Name(RenameMode::From)), &["/w/old"]);
        let to = event(EventKind::Modify(ModifyKind::Name(RenameMode::To)), &["/w/new"]);
        let both = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/w/old", "/w/new"],
        );
        assert_eq!(kinds(from), vec![RawEventKind::Rename]);
        assert_eq!(kinds(to), vec![RawEventKind::Create]);
        assert!(kinds(both).is_empty());
    }

    #[test]
    fn create_and_remove_map_per_path() {
        let created = event(EventKind::Create(CreateKind::File), &["/w/a", "/w/b"]);
        let raws = raw_events_from(created);
        assert_eq!(raws.len(), 2);
        assert_eq!(raws[1], RawEvent::new("/w/b", RawEventKind::Create));

        let removed = event(EventKind::Remove(RemoveKind::Folder), &["/w/d"]);
        assert_eq!(kinds(removed), vec![RawEventKind::Delete]);
    }

    #[test]
    fn access_events_are_ignored() {
        let access = event(EventKind::Access(AccessKind::Read), &["/w/a"]);
        assert!(raw_events_from(access).is_empty());
    }
}

// src/engine/pipeline.rs

//! The per-event pipeline run by the consumer loop.
//!
//! For every raw event, strictly in order:
//! 1. sync the watch set (structural changes land before filtering),
//! 2. path pattern gate,
//! 3. event-kind gate,
//! 4. content check, for modify events on files only,
//! 5. throttle gate,
//! 6. command sequence.

use std::path::Path;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::Result;
use crate::exec::{run_sequence, CommandBackend};
use crate::fs::FileSystem;
use crate::types::{RawEvent, RawEventKind};
use crate::watch::{
    content_changed, EventMask, EventSource, FingerprintCache, PatternFilter,
    StabilizeSettings, ThrottleGate, WatchSet,
};

use super::{Disposition, WatchSnapshot};

/// Owns all mutable pipeline state: the watch set, the fingerprint cache and
/// the execution clock. Only the consumer task ever holds a `Pipeline`.
pub struct Pipeline<B: CommandBackend> {
    fs: Arc<dyn FileSystem>,
    source: Box<dyn EventSource>,
    backend: B,
    watch_set: WatchSet,
    cache: FingerprintCache,
    throttle: ThrottleGate,
    mask: EventMask,
    pattern: PatternFilter,
    commands: Vec<String>,
    continue_on_error: bool,
    stabilize: StabilizeSettings,
    events_seen: u64,
    executions: u64,
}

impl<B: CommandBackend> std::fmt::Debug for Pipeline<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("watch_set", &self.watch_set)
            .field("cache", &self.cache)
            .field("throttle", &self.throttle)
            .field("mask", &self.mask)
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}

impl<B: CommandBackend> Pipeline<B> {
    pub fn new(
        config: &Config,
        fs: Arc<dyn FileSystem>,
        source: Box<dyn EventSource>,
        backend: B,
    ) -> Self {
        Self {
            fs,
            source,
            backend,
            watch_set: WatchSet::new(config.recursive()),
            cache: FingerprintCache::new(),
            throttle: ThrottleGate::new(config.min_interval()),
            mask: config.mask().clone(),
            pattern: config.pattern().clone(),
            commands: config.commands().to_vec(),
            continue_on_error: config.continue_on_error(),
            stabilize: StabilizeSettings::with_max_wait(config.stabilize_timeout()),
            events_seen: 0,
            executions: 0,
        }
    }

    /// Override the size-settling parameters (poll interval and threshold).
    pub fn with_stabilize_settings(mut self, settings: StabilizeSettings) -> Self {
        self.stabilize = settings;
        self
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.watch_set
    }

    pub fn fingerprints(&self) -> &FingerprintCache {
        &self.cache
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Register the watch root (and its subdirectories when recursive).
    pub fn bootstrap(&mut self, root: &Path) -> Result<()> {
        self.watch_set
            .bootstrap(self.fs.as_ref(), self.source.as_mut(), root)
    }

    /// Run one event through the pipeline.
    pub async fn handle(&mut self, event: RawEvent) -> Disposition {
        self.events_seen += 1;
        let path = event.path.as_path();
        debug!(kind = ?event.kind, ?path, "received event");

        self.watch_set.sync(
            &event,
            self.fs.as_ref(),
            self.source.as_mut(),
            &mut self.cache,
        );

        if !self.pattern.matches(path) {
            debug!(?path, pattern = self.pattern.as_str(), "path does not match pattern");
            return Disposition::DroppedByPattern;
        }

        let Some(name) = self.mask.admit(event.kind) else {
            debug!(kind = ?event.kind, ?path, mask = %self.mask, "event kind not watched");
            return Disposition::DroppedByType;
        };

        let is_dir = self.watch_set.is_watched_dir(path);
        if !is_dir && event.kind == RawEventKind::Modify {
            let changed = content_changed(&self.fs, &mut self.cache, path, &self.stabilize).await;
            if !changed {
                debug!(?path, "content unchanged");
                return Disposition::Unchanged;
            }
        }

        if !self.throttle.try_pass(Instant::now()) {
            info!(event = %name, ?path, "dropped (minimum interval not reached)");
            return Disposition::Suppressed;
        }

        let report = run_sequence(
            &mut self.backend,
            &self.commands,
            path,
            name,
            self.continue_on_error,
        )
        .await;
        self.executions += 1;

        Disposition::Executed(report)
    }

    /// Current state, for publishing outside the consumer task.
    pub fn snapshot(&self) -> WatchSnapshot {
        WatchSnapshot {
            watched_dirs: self.watch_set.dirs().map(Path::to_path_buf).collect(),
            ..self.snapshot_counts()
        }
    }

    /// Like [`snapshot`](Self::snapshot) without copying the directory list.
    pub fn snapshot_counts(&self) -> WatchSnapshot {
        WatchSnapshot {
            watched_dirs: Vec::new(),
            fingerprints: self.cache.len(),
            events_seen: self.events_seen,
            executions: self.executions,
        }
    }
}

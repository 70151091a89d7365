// src/engine/mod.rs

//! Event engine for watchf.
//!
//! [`Pipeline`] holds all mutable state (watch set, fingerprint cache,
//! execution clock) and decides what to do with each raw event. [`Runtime`]
//! is the consumer loop around it: it drains the event queue one event at a
//! time and publishes a [`WatchSnapshot`] after each one.

use std::path::PathBuf;

use crate::exec::SequenceReport;

/// What the pipeline did with one raw event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Path did not match the include pattern.
    DroppedByPattern,
    /// Event kind has no name, or the name is not in the mask.
    DroppedByType,
    /// Modify event whose content fingerprint did not change (or could not
    /// be read).
    Unchanged,
    /// Minimum interval since the last execution not reached.
    Suppressed,
    /// The command sequence ran.
    Executed(SequenceReport),
}

impl Disposition {
    pub fn executed(&self) -> bool {
        matches!(self, Disposition::Executed(_))
    }
}

/// Point-in-time view of the consumer's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSnapshot {
    /// Watched directories, sorted.
    pub watched_dirs: Vec<PathBuf>,
    /// Number of cached file fingerprints.
    pub fingerprints: usize,
    /// Raw events taken off the queue so far.
    pub events_seen: u64,
    /// Command sequences started so far.
    pub executions: u64,
}

pub mod pipeline;
pub mod runtime;

pub use pipeline::Pipeline;
pub use runtime::Runtime;

// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Wiring up the OS notification source (`notify`) as the event producer.
//! - Keeping the set of watched directories in sync with the tree.
//! - Gating events by path pattern and event kind.
//! - Telling real content changes apart from noise (size settling plus a
//!   per-file fingerprint cache).
//! - Spacing out executions with a global throttle.
//!
//! It does **not** run commands; see [`crate::exec`].

pub mod debounce;
pub mod filter;
pub mod fingerprint;
pub mod source;
pub mod throttle;
pub mod watch_set;
pub mod watcher;

pub use debounce::{content_changed, wait_until_stable, StabilizeSettings};
pub use filter::{classify, EventMask, PatternFilter};
pub use fingerprint::{Fingerprint, FingerprintCache};
pub use source::EventSource;
pub use throttle::ThrottleGate;
pub use watch_set::WatchSet;
pub use watcher::{raw_events_from, NotifySource, EVENT_QUEUE_CAPACITY};

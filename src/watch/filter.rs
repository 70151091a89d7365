// src/watch/filter.rs

//! Event classification and path filtering.
//!
//! Two independent gates every event has to pass before anything expensive
//! happens:
//! - [`PatternFilter`]: a regular expression over the full event path.
//! - [`EventMask`]: the set of event kinds the user asked for.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use regex::Regex;

use crate::errors::Result;
use crate::types::{EventName, RawEventKind};

/// Map a raw notification kind to the semantic kind users subscribe to.
///
/// `AttributeChange` has no semantic kind: metadata-only changes are never
/// reported as `modify`, whatever the mask says.
pub fn classify(kind: RawEventKind) -> Option<EventName> {
    match kind {
        RawEventKind::Create => Some(EventName::Create),
        RawEventKind::Modify => Some(EventName::Modify),
        RawEventKind::Delete => Some(EventName::Delete),
        RawEventKind::Rename => Some(EventName::Rename),
        RawEventKind::AttributeChange => None,
    }
}

/// Set of event kinds the pipeline reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMask {
    names: BTreeSet<EventName>,
}

impl EventMask {
    pub fn all() -> Self {
        Self::from_names(EventName::ALL)
    }

    pub fn from_names<I: IntoIterator<Item = EventName>>(names: I) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    pub fn contains(&self, name: EventName) -> bool {
        self.names.contains(&name)
    }

    pub fn names(&self) -> impl Iterator<Item = EventName> + '_ {
        self.names.iter().copied()
    }

    /// Classify `kind` and return its semantic name if the mask admits it.
    pub fn admit(&self, kind: RawEventKind) -> Option<EventName> {
        classify(kind).filter(|name| self.contains(*name))
    }
}

impl fmt::Display for EventMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.names.iter().map(|n| n.as_str()).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// Compiled include pattern, matched against the whole path string.
#[derive(Clone)]
pub struct PatternFilter {
    regex: Regex,
}

impl fmt::Debug for PatternFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PatternFilter")
            .field(&self.regex.as_str())
            .finish()
    }
}

impl PatternFilter {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }
}

// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::watch::filter::{EventMask, PatternFilter};

/// Configuration as read from (and written to) a TOML file.
///
/// ```toml
/// recursive = true
/// events = ["modify", "create"]
/// include_pattern = '.*\.rs$'
/// commands = ["cargo build", "echo %f %t"]
/// interval = "500ms"
/// continue_on_error = false
/// stabilize_timeout = "30s"
/// ```
///
/// Every field is optional. Values are kept as written so that a config can
/// be round-tripped by `--write-config`; [`Config`] is the validated form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawConfig {
    /// Watch every directory below the root, not just the root itself.
    #[serde(default)]
    pub recursive: bool,

    /// Event names to react to: `create`, `delete`, `modify`, `rename` or `all`.
    #[serde(default = "default_events")]
    pub events: Vec<String>,

    /// Regular expression matched against the full event path.
    #[serde(default = "default_include_pattern")]
    pub include_pattern: String,

    /// Command templates, run in order. `%f` is the event path, `%t` the
    /// event type.
    #[serde(default)]
    pub commands: Vec<String>,

    /// Minimum spacing between two executions, e.g. `"500ms"`. `"0"` means
    /// no limit.
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Keep running the remaining commands of an event after one fails.
    #[serde(default)]
    pub continue_on_error: bool,

    /// Give up waiting for a file's size to settle after this long.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stabilize_timeout: Option<String>,
}

fn default_events() -> Vec<String> {
    vec!["all".to_string()]
}

fn default_include_pattern() -> String {
    ".*".to_string()
}

fn default_interval() -> String {
    "0".to_string()
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            events: default_events(),
            include_pattern: default_include_pattern(),
            commands: Vec::new(),
            interval: default_interval(),
            continue_on_error: false,
            stabilize_timeout: None,
        }
    }
}

/// Validated configuration consumed read-only by the watch pipeline.
///
/// Built with `Config::try_from(raw)`, which compiles the pattern and parses
/// the event list and durations.
#[derive(Debug, Clone)]
pub struct Config {
    recursive: bool,
    mask: EventMask,
    pattern: PatternFilter,
    commands: Vec<String>,
    min_interval: Duration,
    continue_on_error: bool,
    stabilize_timeout: Option<Duration>,
}

impl Config {
    pub(crate) fn new_unchecked(
        recursive: bool,
        mask: EventMask,
        pattern: PatternFilter,
        commands: Vec<String>,
        min_interval: Duration,
        continue_on_error: bool,
        stabilize_timeout: Option<Duration>,
    ) -> Self {
        Self {
            recursive,
            mask,
            pattern,
            commands,
            min_interval,
            continue_on_error,
            stabilize_timeout,
        }
    }

    pub fn recursive(&self) -> bool {
        self.recursive
    }

    pub fn mask(&self) -> &EventMask {
        &self.mask
    }

    pub fn pattern(&self) -> &PatternFilter {
        &self.pattern
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Zero means unlimited.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    /// `None` waits for a file to settle for as long as it takes.
    pub fn stabilize_timeout(&self) -> Option<Duration> {
        self.stabilize_timeout
    }
}

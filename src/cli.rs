// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawConfig;

/// Command-line arguments for `watchf`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "watchf",
    version,
    about = "Watch a directory and run commands when files change.",
    long_about = None
)]
pub struct CliArgs {
    /// Directory to watch.
    #[arg(value_name = "PATH", default_value = ".")]
    pub path: PathBuf,

    /// Watch subdirectories too.
    #[arg(short, long)]
    pub recursive: bool,

    /// Only react to paths matching this regular expression.
    #[arg(short = 'p', long = "pattern", value_name = "REGEX")]
    pub pattern: Option<String>,

    /// Minimum time between two executions, e.g. `500ms`, `1.5s` or `1m30s`.
    #[arg(short, long, value_name = "DURATION")]
    pub interval: Option<String>,

    /// Events to react to: create, delete, modify, rename or all.
    #[arg(short, long, value_name = "EVENTS", value_delimiter = ',')]
    pub events: Option<Vec<String>>,

    /// Command to run on each event. Repeat for a sequence. `%f` is replaced
    /// by the path, `%t` by the event type.
    #[arg(short, long = "command", value_name = "CMD")]
    pub command: Vec<String>,

    /// Keep running the remaining commands after one fails.
    #[arg(short = 'C', long)]
    pub continue_on_error: bool,

    /// Give up waiting for a modified file's size to settle after this long.
    #[arg(long, value_name = "DURATION")]
    pub stabilize_timeout: Option<String>,

    /// Load settings from a TOML config file. Flags override file values.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the effective settings to the `--config` path (or
    /// `.watchf.toml`) and exit.
    #[arg(short, long)]
    pub write_config: bool,

    /// Stop the watchf instance running in the current directory.
    #[arg(long)]
    pub stop: bool,

    /// Validate settings and print them, but don't watch anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `--verbose`, `WATCHF_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Shorthand for `--log-level debug`.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl CliArgs {
    /// Apply the flags on top of `base` (file values or defaults). Boolean
    /// flags can only switch a setting on.
    pub fn merge_into(&self, mut base: RawConfig) -> RawConfig {
        if self.recursive {
            base.recursive = true;
        }
        if let Some(pattern) = &self.pattern {
            base.include_pattern = pattern.clone();
        }
        if let Some(interval) = &self.interval {
            base.interval = interval.clone();
        }
        if let Some(events) = &self.events {
            base.events = events.iter().map(|e| e.trim().to_string()).collect();
        }
        if !self.command.is_empty() {
            base.commands = self.command.clone();
        }
        if self.continue_on_error {
            base.continue_on_error = true;
        }
        if let Some(timeout) = &self.stabilize_timeout {
            base.stabilize_timeout = Some(timeout.clone());
        }
        base
    }
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

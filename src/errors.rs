// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchfError {
    #[error("no events to watch: the event list is empty")]
    NoEvents,

    #[error("unknown event '{0}' (expected create, delete, modify, rename or all)")]
    UnknownEvent(String),

    #[error("invalid include pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid duration: {0}")]
    InvalidDuration(String),

    #[error("invalid watch root {path:?}: {reason}")]
    InvalidRoot { path: PathBuf, reason: String },

    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("{0} is already running")]
    AlreadyRunning(String),

    #[error("{0} is not running")]
    NotRunning(String),

    #[error("invalid PID file {path:?}: {reason}")]
    InvalidPidFile { path: PathBuf, reason: String },

    #[error("signal error: {0}")]
    Signal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, WatchfError>;

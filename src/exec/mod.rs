// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running the configured commands
//! once an event has made it through the pipeline.
//!
//! - [`command`] substitutes `%f` / `%t` and splits a line into program and
//!   arguments.
//! - [`runner`] runs an event's command sequence in order and applies the
//!   continue-on-error policy.
//! - [`backend`] provides the `CommandBackend` trait and the concrete
//!   `RealCommandBackend` used in production, which tests can replace with a
//!   fake implementation.

pub mod backend;
pub mod command;
pub mod runner;

pub use backend::{CommandBackend, CommandStatus, RealCommandBackend};
pub use command::{substitute, PreparedCommand, VAR_EVENT_TYPE, VAR_FILENAME};
pub use runner::{run_sequence, SequenceReport};

// src/exec/backend.rs

//! Pluggable command backend abstraction.
//!
//! The pipeline talks to a `CommandBackend` instead of spawning processes
//! directly, so tests can swap in a backend that records command lines.
//!
//! - `RealCommandBackend` is the default implementation used by `watchf`.
//!   It runs the program with `tokio::process::Command`, inheriting this
//!   process's stdout and stderr, and waits for it to exit.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

use super::command::PreparedCommand;

/// How a launched command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// Non-zero exit. `-1` when the process was killed by a signal.
    Failed(i32),
}

impl CommandStatus {
    pub fn is_success(self) -> bool {
        matches!(self, CommandStatus::Success)
    }
}

/// Trait abstracting how a single command is executed.
///
/// An `Err` means the command could not be launched at all.
pub trait CommandBackend: Send {
    fn run<'a>(
        &'a mut self,
        command: &'a PreparedCommand,
    ) -> Pin<Box<dyn Future<Output = Result<CommandStatus>> + Send + 'a>>;
}

/// Real backend used in production.
#[derive(Debug, Clone, Default)]
pub struct RealCommandBackend;

impl RealCommandBackend {
    pub fn new() -> Self {
        Self
    }
}

impl CommandBackend for RealCommandBackend {
    fn run<'a>(
        &'a mut self,
        command: &'a PreparedCommand,
    ) -> Pin<Box<dyn Future<Output = Result<CommandStatus>> + Send + 'a>> {
        Box::pin(async move {
            let status = Command::new(&command.program)
                .args(&command.args)
                .stdin(Stdio::null())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .status()
                .await
                .with_context(|| format!("launching '{}'", command.program))?;

            let code = status.code().unwrap_or(-1);
            debug!(cmd = %command, exit_code = code, "command exited");

            if status.success() {
                Ok(CommandStatus::Success)
            } else {
                Ok(CommandStatus::Failed(code))
            }
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn cmd(line: &str) -> PreparedCommand {
        PreparedCommand::parse(line).unwrap()
    }

    #[tokio::test]
    async fn exit_status_is_reported() {
        let mut backend = RealCommandBackend::new();
        assert_eq!(backend.run(&cmd("true")).await.unwrap(), CommandStatus::Success);
        assert_eq!(backend.run(&cmd("false")).await.unwrap(), CommandStatus::Failed(1));
    }

    #[tokio::test]
    async fn missing_program_is_a_launch_error() {
        let mut backend = RealCommandBackend::new();
        assert!(backend
            .run(&cmd("watchf-definitely-not-a-program --flag"))
            .await
            .is_err());
    }
}

// src/exec/runner.rs

//! Runs the configured command sequence for one event.

use std::path::Path;

use tracing::{error, info};

use crate::exec::backend::{CommandBackend, CommandStatus};
use crate::exec::command::{substitute, PreparedCommand};
use crate::types::EventName;

/// What happened to one event's command sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReport {
    /// Command lines that were launched, after substitution.
    pub executed: Vec<String>,
    /// Command lines that failed to launch or exited non-zero.
    pub failed: Vec<String>,
    /// Commands skipped because an earlier one failed.
    pub skipped: usize,
}

impl SequenceReport {
    pub fn succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Run `templates` in order for an event on `path`.
///
/// A failing command stops the rest of the sequence unless
/// `continue_on_error` is set. Failures are logged, never returned: one bad
/// command must not stop the watch loop.
pub async fn run_sequence<B: CommandBackend + ?Sized>(
    backend: &mut B,
    templates: &[String],
    path: &Path,
    event: EventName,
    continue_on_error: bool,
) -> SequenceReport {
    let mut report = SequenceReport::default();

    for (idx, template) in templates.iter().enumerate() {
        let line = substitute(template, path, event);

        let outcome = match PreparedCommand::parse(&line) {
            Some(command) => {
                info!(event = %event, ?path, cmd = %command, "exec");
                report.executed.push(command.to_string());
                backend.run(&command).await
            }
            None => Err(anyhow::anyhow!("command template {template:?} is empty")),
        };

        let failed = match outcome {
            Ok(CommandStatus::Success) => false,
            Ok(CommandStatus::Failed(code)) => {
                error!(cmd = %line, exit_code = code, "command failed");
                true
            }
            Err(err) => {
                error!(cmd = %line, error = %err, "command could not be launched");
                true
            }
        };

        if failed {
            report.failed.push(line);
            if !continue_on_error {
                report.skipped = templates.len() - idx - 1;
                break;
            }
        }
    }

    report
}

// src/exec/command.rs

use std::fmt;
use std::path::Path;

use crate::types::EventName;

/// Replaced with the event path.
pub const VAR_FILENAME: &str = "%f";
/// Replaced with the event type (`create`, `modify`, ...).
pub const VAR_EVENT_TYPE: &str = "%t";

/// Substitute `%f` and `%t` into a command template.
pub fn substitute(template: &str, path: &Path, event: EventName) -> String {
    template
        .replace(VAR_FILENAME, &path.to_string_lossy())
        .replace(VAR_EVENT_TYPE, event.as_str())
}

/// A command line split into program and arguments.
///
/// Splitting is plain whitespace splitting: there is no quoting or escaping,
/// so a path containing spaces ends up as several arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PreparedCommand {
    /// Returns `None` for a blank line.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Substitute the event into `template` and split the result.
    pub fn for_event(template: &str, path: &Path, event: EventName) -> Option<Self> {
        Self::parse(&substitute(template, path, event))
    }
}

impl fmt::Display for PreparedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_and_type_are_substituted() {
        let cmd =
            PreparedCommand::for_event("echo %f %t", Path::new("/tmp/a.txt"), EventName::Modify)
                .unwrap();
        assert_eq!(cmd.program, "echo");
        assert_eq!(cmd.args, vec!["/tmp/a.txt", "modify"]);
        assert_eq!(cmd.to_string(), "echo /tmp/a.txt modify");
    }

    #[test]
    fn every_occurrence_is_replaced() {
        let line = substitute("cp %f %f.bak # %t/%t", Path::new("x"), EventName::Create);
        assert_eq!(line, "cp x x.bak # create/create");
    }

    #[test]
    fn whitespace_in_paths_splits_arguments() {
        let cmd = PreparedCommand::for_event(
            "cat %f",
            Path::new("/tmp/my file.txt"),
            EventName::Create,
        )
        .unwrap();
        assert_eq!(cmd.args, vec!["/tmp/my", "file.txt"]);
    }

    #[test]
    fn blank_lines_do_not_parse() {
        assert_eq!(PreparedCommand::parse("   \t "), None);
        assert_eq!(PreparedCommand::parse(""), None);
    }
}

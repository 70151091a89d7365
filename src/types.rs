use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of a raw notification as delivered by the notification source.
///
/// `AttributeChange` is a metadata-only change (permissions, timestamps,
/// ownership). It is kept distinct from `Modify` so the classifier can drop
/// it without ever routing it into the "modify" bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawEventKind {
    Create,
    Modify,
    Delete,
    Rename,
    AttributeChange,
}

/// A single filesystem notification for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub kind: RawEventKind,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, kind: RawEventKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// Semantic event kinds a user can subscribe to.
///
/// The lowercase name is what `%t` expands to in command templates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventName {
    Create,
    Delete,
    Modify,
    Rename,
}

impl EventName {
    pub const ALL: [EventName; 4] = [
        EventName::Create,
        EventName::Delete,
        EventName::Modify,
        EventName::Rename,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EventName::Create => "create",
            EventName::Delete => "delete",
            EventName::Modify => "modify",
            EventName::Rename => "rename",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "create" => Ok(EventName::Create),
            "delete" => Ok(EventName::Delete),
            "modify" => Ok(EventName::Modify),
            "rename" => Ok(EventName::Rename),
            other => Err(format!(
                "invalid event name: {other} (expected create, delete, modify or rename)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_parse_case_insensitively() {
        assert_eq!("MODIFY".parse::<EventName>(), Ok(EventName::Modify));
        assert_eq!(" Create ".parse::<EventName>(), Ok(EventName::Create));
        assert!("attrib".parse::<EventName>().is_err());
    }

    #[test]
    fn display_matches_substitution_names() {
        let names: Vec<String> = EventName::ALL.iter().map(|n| n.to_string()).collect();
        assert_eq!(names, vec!["create", "delete", "modify", "rename"]);
    }
}

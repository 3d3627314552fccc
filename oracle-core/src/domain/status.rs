//! Status vocabularies
//!
//! The remote side uses two unrelated conventions. Generic calls report a
//! `Status` tag which the process client checks; the task-polling handlers
//! report a `Code` tag which only the task poller interprets. They are kept
//! as separate types so one is never compared against the other.

use std::collections::HashMap;
use std::fmt;

/// Tag carrying the generic call status
pub const STATUS_TAG: &str = "Status";

/// Tag carrying the task-polling response code
pub const CODE_TAG: &str = "Code";

/// Value of the `Status` tag on generic calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Ok,
    Other(String),
}

impl RemoteStatus {
    /// Reads the `Status` tag, returning `None` when it is absent
    pub fn from_tags(tags: &HashMap<String, String>) -> Option<Self> {
        tags.get(STATUS_TAG).map(|s| Self::parse(s))
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "200" => Self::Ok,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Value of the `Code` tag on task-polling responses
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskCode {
    /// 200, payload present
    Ok,
    /// 204, nothing pending
    NoContent,
    /// 403, caller not authorized
    Forbidden,
    Unexpected(String),
}

impl TaskCode {
    /// Reads the `Code` tag, returning `None` when it is absent
    pub fn from_tags(tags: &HashMap<String, String>) -> Option<Self> {
        tags.get(CODE_TAG).map(|c| Self::parse(c))
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "200" => Self::Ok,
            "204" => Self::NoContent,
            "403" => Self::Forbidden,
            other => Self::Unexpected(other.to_string()),
        }
    }
}

impl fmt::Display for TaskCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskCode::Ok => write!(f, "200"),
            TaskCode::NoContent => write!(f, "204"),
            TaskCode::Forbidden => write!(f, "403"),
            TaskCode::Unexpected(code) => write!(f, "{}", code),
        }
    }
}

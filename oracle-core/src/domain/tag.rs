//! Tag domain type

use serde::{Deserialize, Serialize};

/// A single name/value pair attached to a message
///
/// Tags form an ordered sequence. Names are not unique on the wire; when a
/// lookup map is built the last occurrence of a name wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(deserialize_with = "crate::codec::deserialize_stringified")]
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

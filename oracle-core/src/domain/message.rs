//! Message domain types
//!
//! `Envelope` is what the node sends to the remote process; `ExecutionResult`
//! is what comes back, either from a dry run or from a settled message.
//! Result field names are accepted in both the capitalized form the compute
//! unit emits and lowercase.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::codec;
use crate::domain::tag::Tag;

/// Unit sent to the remote process in either mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Envelope {
    /// Id of the remote process the envelope is addressed to
    pub target: String,
    pub tags: Vec<Tag>,
    /// Serialized payload, absent when the payload was null
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl Envelope {
    /// Builds an envelope from already encoded tags and a raw payload value
    pub fn new(target: impl Into<String>, tags: Vec<Tag>, payload: &JsonValue) -> Self {
        Self {
            target: target.into(),
            tags,
            data: codec::stringify_payload(payload),
        }
    }
}

/// Result of a single round trip against the remote process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(rename = "Output", alias = "output", default)]
    pub output: JsonValue,

    /// `None` when the response carried no messages field at all
    #[serde(rename = "Messages", alias = "messages", default)]
    pub messages: Option<Vec<ResponseMessage>>,

    #[serde(rename = "Spawns", alias = "spawns", default)]
    pub spawns: Vec<JsonValue>,

    #[serde(
        rename = "Error",
        alias = "error",
        default,
        deserialize_with = "deserialize_error",
        skip_serializing_if = "Option::is_none"
    )]
    pub error: Option<String>,
}

impl ExecutionResult {
    /// Returns the remote error message, if a non-empty one was reported
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().filter(|e| !e.is_empty())
    }
}

/// One message emitted by the remote process while handling a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(rename = "Tags", alias = "tags", default)]
    pub tags: Vec<Tag>,

    #[serde(
        rename = "Data",
        alias = "data",
        default,
        deserialize_with = "codec::deserialize_stringified"
    )]
    pub data: String,
}

/// The compute unit reports errors as strings most of the time, but
/// occasionally as structured values; both collapse to a string here.
fn deserialize_error<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(JsonValue::Null) => None,
        Some(v) => Some(codec::stringify(&v)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_accepts_capitalized_fields() {
        let result: ExecutionResult = serde_json::from_value(json!({
            "Output": "",
            "Messages": [{"Tags": [{"name": "Code", "value": "200"}], "Data": "ok"}],
            "Spawns": []
        }))
        .unwrap();

        let messages = result.messages.unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].tags[0], Tag::new("Code", "200"));
        assert_eq!(messages[0].data, "ok");
        assert!(result.error.is_none());
    }

    #[test]
    fn test_result_accepts_lowercase_fields() {
        let result: ExecutionResult = serde_json::from_value(json!({
            "messages": [{"tags": [], "data": "x"}],
            "error": "boom"
        }))
        .unwrap();

        assert_eq!(result.messages.as_ref().unwrap()[0].data, "x");
        assert_eq!(result.error_message(), Some("boom"));
    }

    #[test]
    fn test_missing_messages_is_preserved() {
        let result: ExecutionResult = serde_json::from_value(json!({"Output": 1})).unwrap();
        assert!(result.messages.is_none());
        assert!(result.spawns.is_empty());
    }

    #[test]
    fn test_structured_error_is_stringified() {
        let result: ExecutionResult =
            serde_json::from_value(json!({"Error": {"reason": "out of gas"}})).unwrap();
        assert_eq!(result.error_message(), Some(r#"{"reason":"out of gas"}"#));
    }

    #[test]
    fn test_empty_error_is_not_an_error() {
        let result: ExecutionResult = serde_json::from_value(json!({"Error": ""})).unwrap();
        assert_eq!(result.error_message(), None);
    }

    #[test]
    fn test_envelope_omits_null_payload() {
        let envelope = Envelope::new("proc", vec![Tag::new("Action", "Ping")], &JsonValue::Null);
        assert!(envelope.data.is_none());

        let serialized = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            serialized,
            json!({"Target": "proc", "Tags": [{"name": "Action", "value": "Ping"}]})
        );
    }

    #[test]
    fn test_envelope_stringifies_object_payload() {
        let envelope = Envelope::new("proc", vec![], &json!({"output": "hi"}));
        assert_eq!(envelope.data.as_deref(), Some(r#"{"output":"hi"}"#));
    }
}

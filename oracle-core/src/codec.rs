//! Tag codec
//!
//! Converts named parameters into the ordered tag sequence the remote
//! process expects, and folds tag sequences back into lookup maps.
//! Every value crossing this boundary becomes a string; the coercion is
//! total and never fails.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fmt;

use crate::domain::Tag;

/// Encodes parameters into tags, preserving iteration order
///
/// # Example
/// ```
/// use oracle_core::codec;
///
/// let tags = codec::encode([("Action", "Get-Pending-Task"), ("NodeID", "node-1")]);
/// assert_eq!(tags[0].name, "Action");
/// assert_eq!(tags[1].value, "node-1");
/// ```
pub fn encode<I, K, V>(params: I) -> Vec<Tag>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Serialize + fmt::Debug,
{
    params
        .into_iter()
        .map(|(name, value)| Tag::new(name, stringify_any(&value)))
        .collect()
}

/// Folds tags into a map; later tags overwrite earlier ones of the same name
pub fn decode(tags: &[Tag]) -> HashMap<String, String> {
    tags.iter()
        .map(|tag| (tag.name.clone(), tag.value.clone()))
        .collect()
}

/// Coerces a JSON value to its wire string
///
/// Strings pass through, numbers use their canonical decimal form, and
/// everything else is JSON-encoded.
pub fn stringify(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Coerces any serializable value to its wire string
///
/// Values that refuse to serialize (maps with non-string keys, failing
/// `Serialize` impls) fall back to their `Debug` rendering.
pub fn stringify_any<T>(value: &T) -> String
where
    T: Serialize + fmt::Debug + ?Sized,
{
    match serde_json::to_value(value) {
        Ok(json) => stringify(&json),
        Err(_) => format!("{:?}", value),
    }
}

/// Serializes a message payload; null payloads are omitted entirely
pub fn stringify_payload(payload: &JsonValue) -> Option<String> {
    match payload {
        JsonValue::Null => None,
        other => Some(stringify(other)),
    }
}

/// Deserializes any JSON value into its wire string
pub(crate) fn deserialize_stringified<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(match value {
        JsonValue::Null => String::new(),
        other => stringify(&other),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::Serializer;
    use serde_json::json;

    #[test]
    fn test_encode_preserves_order() {
        let tags = encode([("b", json!(1)), ("a", json!("x")), ("c", json!(true))]);
        let names: Vec<_> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
        assert_eq!(tags[0].value, "1");
        assert_eq!(tags[1].value, "x");
        assert_eq!(tags[2].value, "true");
    }

    #[test]
    fn test_decode_last_occurrence_wins() {
        let tags = vec![
            Tag::new("Code", "200"),
            Tag::new("Action", "Reply"),
            Tag::new("Code", "204"),
        ];
        let map = decode(&tags);
        assert_eq!(map.len(), 2);
        assert_eq!(map["Code"], "204");
    }

    #[test]
    fn test_decode_encode_round_trip() {
        let mut params = HashMap::new();
        params.insert("Action".to_string(), "Task-Response".to_string());
        params.insert("X-Reference".to_string(), "t1".to_string());
        params.insert("Empty".to_string(), String::new());

        assert_eq!(decode(&encode(params.clone())), params);
    }

    #[test]
    fn test_stringify_primitives() {
        assert_eq!(stringify(&json!("plain")), "plain");
        assert_eq!(stringify(&json!(42)), "42");
        assert_eq!(stringify(&json!(-1.5)), "-1.5");
        assert_eq!(stringify(&json!(false)), "false");
        assert_eq!(stringify(&JsonValue::Null), "null");
    }

    #[test]
    fn test_stringify_structures_as_json() {
        assert_eq!(stringify(&json!({"output": "x"})), r#"{"output":"x"}"#);
        assert_eq!(stringify(&json!([1, "a"])), r#"[1,"a"]"#);
    }

    #[test]
    fn test_stringify_any_falls_back_on_unserializable_keys() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");
        assert_eq!(stringify_any(&map), r#"{(1, 2): "pair"}"#);
    }

    #[derive(Debug)]
    struct Refuses;

    impl Serialize for Refuses {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("cannot serialize"))
        }
    }

    #[test]
    fn test_stringify_any_never_fails() {
        assert_eq!(stringify_any(&Refuses), "Refuses");
        assert_eq!(stringify_any("text"), "text");
        assert_eq!(stringify_any(&7u64), "7");
    }

    #[test]
    fn test_stringify_payload_omits_null() {
        assert_eq!(stringify_payload(&JsonValue::Null), None);
        assert_eq!(stringify_payload(&json!(3)), Some("3".to_string()));
        assert_eq!(stringify_payload(&json!("raw")), Some("raw".to_string()));
    }
}

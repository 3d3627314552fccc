//! Task domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Unit of work owned by the remote process
///
/// The node only reads tasks and appends an output; every other field is
/// maintained remotely. `reference` is unique for the lifetime of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(rename = "ref", deserialize_with = "crate::codec::deserialize_stringified")]
    pub reference: String,
    pub prompt: String,
    /// Opaque inference configuration, forwarded as-is
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<JsonValue>,
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: TaskStatus,
    #[serde(rename = "resolveNode", default, skip_serializing_if = "Option::is_none")]
    pub resolve_node: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitter: Option<String>,
    #[serde(
        rename = "createdAt",
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename = "updatedAt",
        default,
        serialize_with = "chrono::serde::ts_milliseconds_option::serialize",
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Task lifecycle status as reported by the remote process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Done,
    #[serde(other)]
    Other,
}

// Remote-owned metadata: unrecognised shapes decode to the default.

fn lenient_status<'de, D>(deserializer: D) -> Result<TaskStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(TaskStatus::deserialize(value).unwrap_or_default())
}

/// Accepts epoch milliseconds (integer, float or numeric string) and RFC 3339
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    Ok(parse_timestamp(&value))
}

fn parse_timestamp(value: &JsonValue) -> Option<DateTime<Utc>> {
    match value {
        JsonValue::Number(n) => {
            let millis = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(millis)
        }
        JsonValue::String(s) => match s.trim().parse::<i64>() {
            Ok(millis) => DateTime::from_timestamp_millis(millis),
            Err(_) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_task_payload() {
        let task: Task = serde_json::from_value(json!({"ref": "t1", "prompt": "hi"})).unwrap();
        assert_eq!(task.reference, "t1");
        assert_eq!(task.prompt, "hi");
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.config.is_none());
        assert!(task.created_at.is_none());
    }

    #[test]
    fn test_full_task_payload() {
        let task: Task = serde_json::from_value(json!({
            "ref": 42,
            "prompt": "summarize",
            "config": {"n_predict": 64},
            "status": "done",
            "resolveNode": "node-1",
            "output": "summary",
            "submitter": "abc",
            "createdAt": 1_700_000_000_000i64,
            "updatedAt": 1_700_000_005_000i64
        }))
        .unwrap();

        assert_eq!(task.reference, "42");
        assert_eq!(task.config, Some(json!({"n_predict": 64})));
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.resolve_node.as_deref(), Some("node-1"));
        assert_eq!(task.created_at.unwrap().timestamp(), 1_700_000_000);
        assert_eq!(task.updated_at.unwrap().timestamp(), 1_700_000_005);
    }

    #[test]
    fn test_unknown_status_maps_to_other() {
        let task: Task =
            serde_json::from_value(json!({"ref": "t", "prompt": "p", "status": "processing"}))
                .unwrap();
        assert_eq!(task.status, TaskStatus::Other);
    }

    #[test]
    fn test_metadata_shapes_do_not_reject_task() {
        let task: Task = serde_json::from_value(json!({
            "ref": "t1",
            "prompt": "hi",
            "status": null,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": 1_700_000_000_000.0
        }))
        .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at.unwrap().timestamp(), 1_704_067_200);
        assert_eq!(task.updated_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_unreadable_metadata_decodes_to_default() {
        let task: Task = serde_json::from_value(json!({
            "ref": "t1",
            "prompt": "hi",
            "status": 3,
            "createdAt": "yesterday",
            "updatedAt": {"ms": 1}
        }))
        .unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.created_at.is_none());
        assert!(task.updated_at.is_none());
    }

    #[test]
    fn test_timestamps_serialize_as_millis() {
        let task: Task = serde_json::from_value(json!({
            "ref": "t1",
            "prompt": "hi",
            "createdAt": "1700000000000"
        }))
        .unwrap();

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["createdAt"], json!(1_700_000_000_000i64));
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn test_task_requires_prompt() {
        let result = serde_json::from_value::<Task>(json!({"ref": "t"}));
        assert!(result.is_err());
    }
}

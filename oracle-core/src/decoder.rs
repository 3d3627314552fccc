//! Result decoder
//!
//! Pulls tags and payload data out of an [`ExecutionResult`]. Payloads may
//! be JSON-encoded or plain text; the decoder never guesses which, it
//! returns a [`Payload`] and lets the caller match on it.

use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use crate::codec;
use crate::domain::{ExecutionResult, ResponseMessage};
use crate::error::DecodeError;

/// Message data, either parsed JSON or the raw string it came as
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(JsonValue),
    Raw(String),
}

impl Payload {
    /// Parses raw message data, keeping it verbatim when it is not JSON
    pub fn parse(data: &str) -> Self {
        match serde_json::from_str(data) {
            Ok(json) => Payload::Json(json),
            Err(_) => Payload::Raw(data.to_string()),
        }
    }

    /// Deserializes a JSON payload into `T`
    ///
    /// Returns `None` for raw payloads or when the JSON does not have the
    /// expected shape.
    pub fn into_typed<T: DeserializeOwned>(self) -> Option<T> {
        match self {
            Payload::Json(json) => serde_json::from_value(json).ok(),
            Payload::Raw(_) => None,
        }
    }

    /// Renders the payload back to a string
    pub fn to_text(&self) -> String {
        match self {
            Payload::Json(json) => codec::stringify(json),
            Payload::Raw(raw) => raw.clone(),
        }
    }
}

/// Returns every message in the result, as-is
///
/// Multi-message responses are not merged; callers that need more than the
/// first message walk this slice themselves.
pub fn messages_of(result: &ExecutionResult) -> Result<&[ResponseMessage], DecodeError> {
    result
        .messages
        .as_deref()
        .ok_or(DecodeError::InvalidFormat)
}

/// Returns the message at `index`
pub fn message_at(result: &ExecutionResult, index: usize) -> Result<&ResponseMessage, DecodeError> {
    let messages = messages_of(result)?;
    messages.get(index).ok_or(DecodeError::Index {
        index,
        len: messages.len(),
    })
}

/// Decodes the tags of the message at `index` into a lookup map
pub fn tags_of(result: &ExecutionResult, index: usize) -> Result<HashMap<String, String>, DecodeError> {
    message_at(result, index).map(|message| codec::decode(&message.tags))
}

/// Decodes the data of the message at `index`
pub fn data_of(result: &ExecutionResult, index: usize) -> Result<Payload, DecodeError> {
    message_at(result, index).map(|message| Payload::parse(&message.data))
}

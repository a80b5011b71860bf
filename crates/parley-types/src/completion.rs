//! Completion backend wire types for Parley.
//!
//! The backend is stateless: every request carries the full ordered history
//! and the reply is a single JSON object with the assistant's text.

use serde::{Deserialize, Serialize};

use crate::message::Message;

/// Body POSTed to the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    #[serde(rename = "messageList")]
    pub message_list: Vec<Message>,
}

/// Successful reply from the completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionReply {
    pub content: String,
}

impl CompletionReply {
    /// Pull the reply out of an arbitrary JSON body.
    ///
    /// Anything other than an object with a string `content` field is a
    /// contract violation.
    pub fn from_value(value: serde_json::Value) -> Result<Self, CompletionError> {
        match value.get("content") {
            Some(serde_json::Value::String(content)) => Ok(Self {
                content: content.clone(),
            }),
            Some(other) => Err(CompletionError::Malformed(format!(
                "`content` is not a string: {other}"
            ))),
            None => Err(CompletionError::Malformed(
                "response has no `content` field".to_string(),
            )),
        }
    }
}

/// Errors from a single round trip to the completion backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("request aborted")]
    Aborted,
}

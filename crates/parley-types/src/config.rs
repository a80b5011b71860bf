//! Client configuration types for Parley.
//!
//! `ClientConfig` represents the `config.toml` in the data directory that
//! points the client at its collaborators and tunes session behavior.

use serde::{Deserialize, Serialize};

use crate::message::TimestampStyle;

/// What to do with a send issued while a reply is still being generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusyPolicy {
    /// Ignore the send and leave history untouched.
    #[default]
    Reject,
    /// Let overlapping exchanges run; each appends its own reply when it lands.
    Race,
}

/// Top-level configuration for the Parley client.
///
/// Loaded from `~/.parley/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Completion endpoint receiving `{"messageList": [...]}`.
    #[serde(default = "default_completion_url")]
    pub completion_url: String,

    /// Credit service endpoint returning `{"balance": n}`.
    #[serde(default = "default_balance_url")]
    pub balance_url: String,

    /// Storage key holding the serialized history.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Largest value the storage accepts, in bytes.
    #[serde(default = "default_storage_quota_bytes")]
    pub storage_quota_bytes: usize,

    /// Deadline for one completion request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Deadline for one balance fetch.
    #[serde(default = "default_balance_timeout_ms")]
    pub balance_timeout_ms: u64,

    #[serde(default)]
    pub timestamp_style: TimestampStyle,

    #[serde(default)]
    pub busy_policy: BusyPolicy,

    /// Name shown in the header and the typing indicator.
    #[serde(default = "default_assistant_name")]
    pub assistant_name: String,

    #[serde(default = "default_assistant_info")]
    pub assistant_info: String,

    /// Label in front of the credit balance.
    #[serde(default = "default_credit_label")]
    pub credit_label: String,
}

fn default_completion_url() -> String {
    "http://localhost:3000/api/openai".to_string()
}

fn default_balance_url() -> String {
    "http://localhost:3000/api/credits".to_string()
}

fn default_storage_key() -> String {
    "messages".to_string()
}

fn default_storage_quota_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_request_timeout_ms() -> u64 {
    120_000
}

fn default_balance_timeout_ms() -> u64 {
    10_000
}

fn default_assistant_name() -> String {
    "PirateGPT".to_string()
}

fn default_assistant_info() -> String {
    "GPT-4 by OpenAI".to_string()
}

fn default_credit_label() -> String {
    "Chipps".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            completion_url: default_completion_url(),
            balance_url: default_balance_url(),
            storage_key: default_storage_key(),
            storage_quota_bytes: default_storage_quota_bytes(),
            request_timeout_ms: default_request_timeout_ms(),
            balance_timeout_ms: default_balance_timeout_ms(),
            timestamp_style: TimestampStyle::default(),
            busy_policy: BusyPolicy::default(),
            assistant_name: default_assistant_name(),
            assistant_info: default_assistant_info(),
            credit_label: default_credit_label(),
        }
    }
}

impl ClientConfig {
    /// Text of the typing indicator, e.g. `PirateGPT is thinking`.
    pub fn typing_indicator(&self) -> String {
        format!("{} is thinking", self.assistant_name)
    }
}

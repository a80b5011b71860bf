//! Conversation message types for Parley.
//!
//! A `Message` is the atomic unit of conversation history. The serialized
//! shape is shared by the persisted history blob and the `messageList` sent to
//! the completion backend, so field and variant names are part of the wire
//! format:
//!
//! ```json
//! {"message":"Hello","sentTime":"just now","sender":"Me","direction":"outgoing","position":"normal"}
//! ```

use chrono::Local;
use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Label used for messages when the relative timestamp style is active.
pub const JUST_NOW: &str = "just now";

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "Me", alias = "user")]
    User,
    #[serde(rename = "OpenAI", alias = "assistant")]
    Assistant,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" | "me" => Ok(Sender::User),
            "assistant" | "openai" => Ok(Sender::Assistant),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// Whether a message travels from the user or towards the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Outgoing,
    Incoming,
}

impl Direction {
    /// The only direction a message from `sender` may carry.
    pub fn for_sender(sender: Sender) -> Self {
        match sender {
            Sender::User => Direction::Outgoing,
            Sender::Assistant => Direction::Incoming,
        }
    }
}

/// Visual grouping hint. Only one grouping exists today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Normal,
}

/// A single entry in the conversation history.
///
/// Construct through [`Message::outgoing`] or [`Message::incoming`]; both keep
/// `direction` in step with `sender`. Deserialized values may violate that
/// pairing, which [`Message::is_consistent`] detects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "message")]
    pub text: String,
    /// Human-readable send time. Never used for ordering.
    #[serde(rename = "sentTime")]
    pub timestamp_label: String,
    pub sender: Sender,
    pub direction: Direction,
    #[serde(default)]
    pub position: Position,
}

impl Message {
    /// A message typed by the user.
    pub fn outgoing(text: impl Into<String>, timestamp_label: impl Into<String>) -> Self {
        Self::from_sender(Sender::User, text, timestamp_label)
    }

    /// A reply produced by the assistant.
    pub fn incoming(text: impl Into<String>, timestamp_label: impl Into<String>) -> Self {
        Self::from_sender(Sender::Assistant, text, timestamp_label)
    }

    fn from_sender(
        sender: Sender,
        text: impl Into<String>,
        timestamp_label: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            timestamp_label: timestamp_label.into(),
            sender,
            direction: Direction::for_sender(sender),
            position: Position::Normal,
        }
    }

    /// True when `direction` is `Outgoing` exactly when `sender` is `User`.
    pub fn is_consistent(&self) -> bool {
        self.direction == Direction::for_sender(self.sender)
    }

    pub fn is_from_user(&self) -> bool {
        self.sender == Sender::User
    }
}

/// How send-time labels are produced for new messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampStyle {
    /// Always `"just now"`.
    #[default]
    Relative,
    /// Local wall-clock time, `HH:MM`.
    Clock,
}

impl TimestampStyle {
    /// Produce the label for a message created at this instant.
    pub fn label_now(&self) -> String {
        match self {
            TimestampStyle::Relative => JUST_NOW.to_string(),
            TimestampStyle::Clock => Local::now().format("%H:%M").to_string(),
        }
    }
}

//! Event types for the Parley session event bus.
//!
//! `SessionEvent` is broadcast by the chat session whenever observable state
//! changes. All variants are Clone + Send + Sync for use with tokio broadcast
//! channels.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events emitted by a chat session.
///
/// Subscribers include the balance reflector (which refreshes on every
/// history change) and the terminal front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The message history was replaced or appended to.
    HistoryChanged { len: usize },

    /// The generating (typing) indicator flipped.
    GeneratingChanged { generating: bool },

    /// The unsent input text changed.
    DraftChanged { len: usize },

    /// An exchange ended without an assistant reply.
    ExchangeFailed { exchange_id: Uuid, error: String },
}

impl SessionEvent {
    /// Whether this event reflects a mutation of the message history.
    pub fn is_history_change(&self) -> bool {
        matches!(self, SessionEvent::HistoryChanged { .. })
    }
}

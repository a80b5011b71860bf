//! In-memory chat session state.
//!
//! `ChatSession` owns the ordered message history, the unsent draft, and the
//! generating flag. The in-memory history is the source of truth; every
//! mutation is flushed to the [`SessionStore`] before the lock is released
//! and then announced on the [`EventBus`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use parley_types::event::SessionEvent;
use parley_types::message::Message;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::chat::store::{SaveOutcome, SessionStore};
use crate::event::EventBus;
use crate::storage::kv_store::KvStore;

/// What happened when persisted history was offered to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Persisted messages replaced the (empty) in-memory history.
    Restored(usize),
    /// The session already had messages; storage was not consulted.
    SkippedNonEmpty,
    /// Nothing usable was persisted.
    NothingStored,
}

#[derive(Debug, Default)]
struct SessionState {
    history: Vec<Message>,
    draft_text: String,
    /// Exchanges between "outgoing appended" and "reply appended or failed".
    in_flight: usize,
}

/// Process-wide conversation state, threaded explicitly to its users.
///
/// There is no teardown: the session lives as long as its owner.
pub struct ChatSession<S: KvStore> {
    store: SessionStore<S>,
    state: Mutex<SessionState>,
    events: EventBus,
}

impl<S: KvStore> ChatSession<S> {
    /// Open a session: restore persisted history if any, then flush.
    ///
    /// The flush runs even for a fresh session, so an empty array is written
    /// on first start.
    pub fn open(store: SessionStore<S>, events: EventBus) -> Self {
        let session = Self {
            store,
            state: Mutex::new(SessionState::default()),
            events,
        };
        let outcome = session.restore();
        info!(key = %session.store.key(), ?outcome, "Chat session opened");
        session
    }

    /// Offer persisted history to the session.
    ///
    /// Loaded data is applied only while the in-memory history is empty, so
    /// messages produced by this session are never clobbered. The current
    /// history is written back afterwards either way.
    pub fn restore(&self) -> RestoreOutcome {
        let (outcome, len) = {
            let mut state = self.state();
            let outcome = if !state.history.is_empty() {
                RestoreOutcome::SkippedNonEmpty
            } else {
                let loaded = self.store.load();
                if loaded.is_empty() {
                    RestoreOutcome::NothingStored
                } else {
                    let count = loaded.len();
                    state.history = loaded;
                    RestoreOutcome::Restored(count)
                }
            };
            self.store.save(&state.history);
            (outcome, state.history.len())
        };

        if let RestoreOutcome::Restored(count) = outcome {
            debug!(count, "Restored persisted chat history");
            self.events.publish(SessionEvent::HistoryChanged { len });
        }
        outcome
    }

    /// Snapshot of the ordered history.
    pub fn history(&self) -> Vec<Message> {
        self.state().history.clone()
    }

    pub fn len(&self) -> usize {
        self.state().history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().history.is_empty()
    }

    pub fn draft_text(&self) -> String {
        self.state().draft_text.clone()
    }

    /// Whether a reply is currently being generated.
    pub fn is_generating(&self) -> bool {
        self.state().in_flight > 0
    }

    /// Replace the unsent input text.
    pub fn set_draft(&self, text: impl Into<String>) {
        let len = {
            let mut state = self.state();
            state.draft_text = text.into();
            state.draft_text.len()
        };
        self.events.publish(SessionEvent::DraftChanged { len });
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn store(&self) -> &SessionStore<S> {
        &self.store
    }

    /// Append a message and persist the full history.
    pub fn append(&self, message: Message) -> SaveOutcome {
        let (outcome, len) = {
            let mut state = self.state();
            state.history.push(message);
            (self.store.save(&state.history), state.history.len())
        };
        self.events.publish(SessionEvent::HistoryChanged { len });
        outcome
    }

    /// Start an exchange: raise the generating flag, append the outgoing
    /// message, clear the draft, and return the history to send.
    ///
    /// With `reject_if_busy`, returns `None` without touching any state when
    /// another exchange is still in flight.
    pub(crate) fn begin_exchange(
        &self,
        outgoing: Message,
        reject_if_busy: bool,
    ) -> Option<Vec<Message>> {
        let (snapshot, was_idle) = {
            let mut state = self.state();
            if reject_if_busy && state.in_flight > 0 {
                return None;
            }
            let was_idle = state.in_flight == 0;
            state.in_flight += 1;
            state.history.push(outgoing);
            self.store.save(&state.history);
            state.draft_text.clear();
            (state.history.clone(), was_idle)
        };

        if was_idle {
            self.events
                .publish(SessionEvent::GeneratingChanged { generating: true });
        }
        self.events.publish(SessionEvent::HistoryChanged {
            len: snapshot.len(),
        });
        self.events.publish(SessionEvent::DraftChanged { len: 0 });
        Some(snapshot)
    }

    /// Finish an exchange started by [`begin_exchange`](Self::begin_exchange).
    pub(crate) fn end_exchange(&self) {
        let now_idle = {
            let mut state = self.state();
            state.in_flight = state.in_flight.saturating_sub(1);
            state.in_flight == 0
        };
        if now_idle {
            self.events
                .publish(SessionEvent::GeneratingChanged { generating: false });
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::store::tests::MemoryStorage;
    use parley_types::message::JUST_NOW;
    use std::sync::Arc;

    fn persisted(messages: &[Message]) -> Arc<MemoryStorage> {
        Arc::new(MemoryStorage::with_value(
            "messages",
            &serde_json::to_string(messages).unwrap(),
        ))
    }

    fn open(storage: Arc<MemoryStorage>) -> ChatSession<Arc<MemoryStorage>> {
        ChatSession::open(SessionStore::new(storage, "messages"), EventBus::default())
    }

    #[test]
    fn fresh_session_writes_empty_history() {
        let storage = Arc::new(MemoryStorage::default());
        let session = open(storage.clone());

        assert!(session.is_empty());
        assert!(!session.is_generating());
        assert_eq!(storage.raw("messages").unwrap(), "[]");
    }

    #[test]
    fn reload_restores_prior_messages_in_order() {
        let prior = vec![
            Message::outgoing("Hello", JUST_NOW),
            Message::incoming("Ahoy!", JUST_NOW),
        ];
        let session = open(persisted(&prior));
        assert_eq!(session.history(), prior);
    }

    #[test]
    fn corrupt_storage_opens_empty() {
        let storage = Arc::new(MemoryStorage::with_value("messages", "[{oops"));
        let session = open(storage.clone());
        assert!(session.is_empty());
        // The corrupt blob is replaced by the (empty) in-memory truth.
        assert_eq!(storage.raw("messages").unwrap(), "[]");
        assert_eq!(storage.raw("messages.corrupt").unwrap(), "[{oops");
    }

    #[test]
    fn restore_never_clobbers_existing_history() {
        let storage = Arc::new(MemoryStorage::default());
        let session = open(storage.clone());
        session.append(Message::outgoing("mine", JUST_NOW));

        // Someone else writes different history behind our back.
        storage.values.lock().unwrap().insert(
            "messages".to_string(),
            serde_json::to_string(&vec![Message::outgoing("theirs", JUST_NOW)]).unwrap(),
        );

        assert_eq!(session.restore(), RestoreOutcome::SkippedNonEmpty);
        assert_eq!(session.history()[0].text, "mine");
        assert_eq!(session.len(), 1);
        // And the in-memory truth is written back.
        assert!(storage.raw("messages").unwrap().contains("mine"));
    }

    #[test]
    fn restore_reports_outcomes() {
        let session = open(Arc::new(MemoryStorage::default()));
        assert_eq!(session.restore(), RestoreOutcome::NothingStored);

        let prior = vec![Message::outgoing("Hello", JUST_NOW)];
        let storage = persisted(&prior);
        let session = ChatSession::open(
            SessionStore::new(storage.clone(), "messages"),
            EventBus::default(),
        );
        assert_eq!(session.len(), 1);
        assert_eq!(session.restore(), RestoreOutcome::SkippedNonEmpty);
    }

    #[test]
    fn append_persists_every_mutation() {
        let storage = Arc::new(MemoryStorage::default());
        let session = open(storage.clone());

        session.append(Message::outgoing("one", JUST_NOW));
        session.append(Message::incoming("two", JUST_NOW));

        let writes = storage.writes.lock().unwrap().clone();
        // Startup flush plus one write per append.
        assert_eq!(writes.len(), 3);
        assert_eq!(writes[0], "[]");
        let last: Vec<Message> = serde_json::from_str(&writes[2]).unwrap();
        assert_eq!(last, session.history());
    }

    #[test]
    fn append_survives_storage_failure() {
        let storage = Arc::new(MemoryStorage {
            fail_writes: true,
            ..Default::default()
        });
        let session = open(storage);
        let outcome = session.append(Message::outgoing("still here", JUST_NOW));
        assert!(!outcome.is_saved());
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn append_publishes_history_changed() {
        let session = open(Arc::new(MemoryStorage::default()));
        let mut rx = session.subscribe();

        session.append(Message::outgoing("Hello", JUST_NOW));

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::HistoryChanged { len: 1 });
    }

    #[test]
    fn draft_updates_and_is_cleared_by_exchange() {
        let session = open(Arc::new(MemoryStorage::default()));
        session.set_draft("Hel");
        assert_eq!(session.draft_text(), "Hel");

        let sent = session
            .begin_exchange(Message::outgoing("Hello", JUST_NOW), true)
            .unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(session.draft_text(), "");
        assert!(session.is_generating());
    }

    #[test]
    fn begin_exchange_rejects_while_busy() {
        let session = open(Arc::new(MemoryStorage::default()));
        session
            .begin_exchange(Message::outgoing("first", JUST_NOW), true)
            .unwrap();

        assert!(session
            .begin_exchange(Message::outgoing("second", JUST_NOW), true)
            .is_none());
        assert_eq!(session.len(), 1);

        session.end_exchange();
        assert!(!session.is_generating());
    }

    #[test]
    fn overlapping_exchanges_keep_flag_until_last_ends() {
        let session = open(Arc::new(MemoryStorage::default()));
        session.begin_exchange(Message::outgoing("a", JUST_NOW), false);
        session.begin_exchange(Message::outgoing("b", JUST_NOW), false);

        session.end_exchange();
        assert!(session.is_generating());
        session.end_exchange();
        assert!(!session.is_generating());
        // Extra ends are harmless.
        session.end_exchange();
        assert!(!session.is_generating());
    }
}

//! Session store: the durability mirror of the message history.
//!
//! The whole ordered history lives under a single storage key as one JSON
//! array. Every save rewrites the entire array. Reads fail soft: missing,
//! unreadable, or unparsable data is the same as "no history".

use parley_types::error::StorageError;
use parley_types::message::Message;
use tracing::{debug, warn};

use crate::storage::kv_store::KvStore;

/// Result of a best-effort save.
///
/// Callers are free to ignore it; it exists so the failure path can be
/// observed in tests and logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { bytes: usize },
    Failed(StorageError),
}

impl SaveOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }
}

/// Reads and writes the serialized history through a [`KvStore`].
pub struct SessionStore<S: KvStore> {
    storage: S,
    key: String,
}

impl<S: KvStore> SessionStore<S> {
    /// Create a store persisting under `key`.
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Access the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Load the persisted history, or an empty one if nothing usable is stored.
    ///
    /// Never fails: every storage or parse error is logged and treated as
    /// "no data". A stored value that cannot be parsed is copied to
    /// [`backup_key`](Self::backup_key) first, since the next save
    /// overwrites it.
    pub fn load(&self) -> Vec<Message> {
        match self.try_load() {
            Ok(history) => history,
            Err(StorageError::Corrupt(reason)) => {
                self.set_aside(&reason);
                Vec::new()
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Discarding unreadable chat history");
                Vec::new()
            }
        }
    }

    /// Key holding the last history value that failed to parse.
    pub fn backup_key(&self) -> String {
        format!("{}.corrupt", self.key)
    }

    fn set_aside(&self, reason: &str) {
        let Ok(Some(raw)) = self.storage.get(&self.key) else {
            return;
        };
        let backup = self.backup_key();
        match self.storage.set(&backup, &raw) {
            Ok(()) => warn!(
                key = %self.key,
                %backup,
                %reason,
                "Unreadable chat history moved aside, starting empty"
            ),
            Err(e) => warn!(
                key = %self.key,
                %reason,
                error = %e,
                "Discarding unreadable chat history, backup failed"
            ),
        }
    }

    /// Load the persisted history, surfacing why it could not be read.
    pub fn try_load(&self) -> Result<Vec<Message>, StorageError> {
        let raw = match self.storage.get(&self.key)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                debug!(key = %self.key, "No persisted chat history");
                return Ok(Vec::new());
            }
        };

        let history: Vec<Message> = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Corrupt(format!("invalid history JSON: {e}")))?;

        if let Some(index) = history.iter().position(|m| !m.is_consistent()) {
            return Err(StorageError::Corrupt(format!(
                "message {index} has a direction that does not match its sender"
            )));
        }

        debug!(key = %self.key, count = history.len(), "Loaded chat history");
        Ok(history)
    }

    /// Serialize the full history and overwrite the stored value.
    pub fn save(&self, history: &[Message]) -> SaveOutcome {
        let serialized = match serde_json::to_string(history) {
            Ok(s) => s,
            Err(e) => {
                let err = StorageError::Corrupt(format!("failed to serialize history: {e}"));
                warn!(key = %self.key, error = %err, "Chat history not persisted");
                return SaveOutcome::Failed(err);
            }
        };

        match self.storage.set(&self.key, &serialized) {
            Ok(()) => SaveOutcome::Saved {
                bytes: serialized.len(),
            },
            Err(e) => {
                warn!(key = %self.key, error = %e, "Chat history not persisted");
                SaveOutcome::Failed(e)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parley_types::message::JUST_NOW;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-process storage double with switchable failure modes.
    #[derive(Default)]
    pub(crate) struct MemoryStorage {
        pub(crate) values: Mutex<HashMap<String, String>>,
        pub(crate) fail_reads: bool,
        pub(crate) fail_writes: bool,
        pub(crate) writes: Mutex<Vec<String>>,
    }

    impl MemoryStorage {
        pub(crate) fn with_value(key: &str, value: &str) -> Self {
            let storage = Self::default();
            storage
                .values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            storage
        }

        pub(crate) fn raw(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }
    }

    impl KvStore for MemoryStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            if self.fail_reads {
                return Err(StorageError::Unavailable("reads disabled".to_string()));
            }
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::QuotaExceeded {
                    limit: 0,
                    requested: value.len(),
                });
            }
            self.writes.lock().unwrap().push(value.to_string());
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn two_messages() -> Vec<Message> {
        vec![
            Message::outgoing("Hello", JUST_NOW),
            Message::incoming("Ahoy!", JUST_NOW),
        ]
    }

    #[test]
    fn load_missing_key_is_empty() {
        let store = SessionStore::new(MemoryStorage::default(), "messages");
        assert!(store.load().is_empty());
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn load_empty_string_is_empty() {
        let store = SessionStore::new(MemoryStorage::with_value("messages", ""), "messages");
        assert!(store.try_load().unwrap().is_empty());
    }

    #[test]
    fn load_invalid_json_is_empty() {
        let store = SessionStore::new(
            MemoryStorage::with_value("messages", "{not json"),
            "messages",
        );
        assert!(store.load().is_empty());
        assert!(matches!(store.try_load(), Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn load_wrong_shape_is_empty() {
        let store = SessionStore::new(
            MemoryStorage::with_value("messages", r#"{"message":"not an array"}"#),
            "messages",
        );
        assert!(store.load().is_empty());

        let store = SessionStore::new(MemoryStorage::with_value("messages", "null"), "messages");
        assert!(store.load().is_empty());
    }

    #[test]
    fn load_inconsistent_message_is_empty() {
        let blob = r#"[{"message":"hi","sentTime":"just now","sender":"OpenAI","direction":"outgoing","position":"normal"}]"#;
        let store = SessionStore::new(MemoryStorage::with_value("messages", blob), "messages");
        assert!(store.load().is_empty());
        let err = store.try_load().unwrap_err();
        assert!(err.to_string().contains("message 0"));
    }

    #[test]
    fn load_keeps_unparsable_history_under_backup_key() {
        let blob = r#"[{"message":"Hello","sentTime":"just now","sender":"Me","direction":"outgoing"},{"message":"bad","sentTime":"just now","sender":"Me","direction":"incoming"}]"#;
        let store = SessionStore::new(MemoryStorage::with_value("messages", blob), "messages");

        assert!(store.load().is_empty());

        assert_eq!(store.backup_key(), "messages.corrupt");
        assert_eq!(store.storage().raw("messages.corrupt").as_deref(), Some(blob));
        // The original key is untouched until the next save.
        assert_eq!(store.storage().raw("messages").as_deref(), Some(blob));
    }

    #[test]
    fn load_missing_history_writes_no_backup() {
        let store = SessionStore::new(MemoryStorage::default(), "messages");
        assert!(store.load().is_empty());
        assert!(store.storage().raw("messages.corrupt").is_none());
        assert!(store.storage().writes.lock().unwrap().is_empty());
    }

    #[test]
    fn load_unavailable_storage_is_empty() {
        let storage = MemoryStorage {
            fail_reads: true,
            ..Default::default()
        };
        let store = SessionStore::new(storage, "messages");
        assert!(store.load().is_empty());
        assert!(matches!(store.try_load(), Err(StorageError::Unavailable(_))));
    }

    #[test]
    fn save_then_load_preserves_order_and_fields() {
        let store = SessionStore::new(MemoryStorage::default(), "messages");
        let history = two_messages();

        assert!(store.save(&history).is_saved());
        let loaded = store.load();
        assert_eq!(loaded, history);

        // Saving what was loaded produces the same blob again.
        let first = store.storage().raw("messages").unwrap();
        store.save(&loaded);
        let second = store.storage().raw("messages").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn save_empty_history_writes_empty_array() {
        let store = SessionStore::new(MemoryStorage::default(), "messages");
        assert_eq!(store.save(&[]), SaveOutcome::Saved { bytes: 2 });
        assert_eq!(store.storage().raw("messages").unwrap(), "[]");
    }

    #[test]
    fn save_failure_is_reported_not_raised() {
        let storage = MemoryStorage {
            fail_writes: true,
            ..Default::default()
        };
        let store = SessionStore::new(storage, "messages");
        let outcome = store.save(&two_messages());
        assert!(matches!(
            outcome,
            SaveOutcome::Failed(StorageError::QuotaExceeded { .. })
        ));
        assert!(!outcome.is_saved());
    }

    #[test]
    fn store_uses_its_own_key() {
        let store = SessionStore::new(MemoryStorage::default(), "pirate");
        store.save(&two_messages());
        assert_eq!(store.key(), "pirate");
        assert!(store.storage().raw("pirate").is_some());
        assert!(store.storage().raw("messages").is_none());
    }
}

//! In-memory key-value store.
//!
//! Used for `--ephemeral` sessions and tests. Values are lost on exit.

use dashmap::DashMap;

use parley_core::storage::kv_store::KvStore;
use parley_types::error::StorageError;

use super::validate_key;

/// Concurrent map-backed store with an optional per-value quota.
#[derive(Debug, Default)]
pub struct InMemoryKvStore {
    values: DashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            values: DashMap::new(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KvStore for InMemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        validate_key(key)?;
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        if let Some(limit) = self.quota_bytes {
            if value.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    limit,
                    requested: value.len(),
                });
            }
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

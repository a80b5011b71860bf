//! Key-value store trait.
//!
//! Models browser-style local storage: string keys, string values,
//! synchronous access, full-overwrite writes, and a capacity bound.
//! Implementations live in parley-infra.

use std::sync::Arc;

use parley_types::error::StorageError;

/// Trait for synchronous, string-keyed persistent storage.
///
/// Reads of a key that was never written return `Ok(None)`. Writes replace
/// the whole value; there is no partial update.
pub trait KvStore: Send + Sync {
    /// Get a value by key. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value for a key.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

//! Key-value storage backends for the session store.
//!
//! - `file`: one JSON file per key under the data directory (`FileKvStore`)
//! - `memory`: process-local map for ephemeral sessions (`InMemoryKvStore`)

pub mod file;
pub mod memory;

pub use file::FileKvStore;
pub use memory::InMemoryKvStore;

/// Reject keys that could escape the storage directory.
pub(crate) fn validate_key(key: &str) -> Result<(), parley_types::error::StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        && !key.starts_with('.');
    if valid {
        Ok(())
    } else {
        Err(parley_types::error::StorageError::Unavailable(format!(
            "invalid storage key: {key:?}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_key() {
        assert!(validate_key("messages").is_ok());
        assert!(validate_key("chat_v2.backup").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key(".hidden").is_err());
        assert!(validate_key("a/b").is_err());
    }
}

//! Durable key-value storage for client state.
//!
//! - [`FileStorage`]: JSON object file with atomic replace-on-write.
//! - [`MemoryStorage`]: process-local map for ephemeral sessions and tests.
//! - [`FavouriteSetStore`]: typed access to the persisted favourite set.

mod favourites;
mod file;
mod keys;
mod memory;
mod traits;

pub use favourites::FavouriteSetStore;
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::KeyValueStorage;

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure (poisoned lock, unsupported operation).
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Stored data could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Open the default file-backed store at `path`.
pub fn create_storage(path: &Path) -> StorageResult<Box<dyn KeyValueStorage>> {
    Ok(Box::new(FileStorage::open(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_storage_is_durable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let storage = create_storage(&path).unwrap();
        storage.set("k", "v").unwrap();
        drop(storage);

        let reopened = create_storage(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap(), Some("v".to_string()));
        assert!(reopened.has("k").unwrap());
        assert!(!reopened.has("missing").unwrap());
    }

    #[test]
    fn test_storage_keys_constants() {
        assert_eq!(StorageKeys::FAVOURITES, "favourite");
    }
}

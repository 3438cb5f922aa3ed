//! Typed access to the persisted favourite set.

use crate::{KeyValueStorage, StorageError, StorageKeys, StorageResult};
use std::collections::BTreeSet;

/// Reads and writes the favourite-id set as a JSON array of strings under
/// [`StorageKeys::FAVOURITES`].
pub struct FavouriteSetStore {
    storage: Box<dyn KeyValueStorage>,
}

impl FavouriteSetStore {
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Load the persisted set; an absent key yields an empty set.
    pub fn load(&self) -> StorageResult<BTreeSet<String>> {
        match self.storage.get(StorageKeys::FAVOURITES)? {
            Some(raw) => {
                let ids: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
                    StorageError::Encoding(format!("favourite set is not a string array: {}", e))
                })?;
                Ok(ids.into_iter().collect())
            }
            None => Ok(BTreeSet::new()),
        }
    }

    /// Replace the persisted set.
    pub fn save(&self, ids: &BTreeSet<String>) -> StorageResult<()> {
        let encoded = serde_json::to_string(ids)?;
        self.storage.set(StorageKeys::FAVOURITES, &encoded)
    }

    pub fn clear(&self) -> StorageResult<bool> {
        self.storage.delete(StorageKeys::FAVOURITES)
    }
}

impl std::fmt::Debug for FavouriteSetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavouriteSetStore").finish_non_exhaustive()
    }
}

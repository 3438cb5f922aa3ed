//! Storage key constants.

/// Keys used in the client key-value store.
pub struct StorageKeys;

impl StorageKeys {
    /// Favourited entity ids (JSON array of strings).
    pub const FAVOURITES: &'static str = "favourite";
}

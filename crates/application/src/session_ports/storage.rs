use admanager_core::AppResult;

/// One mutation inside an atomic storage batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageWrite {
    /// Sets a key to a value.
    Put {
        /// Storage key.
        key: String,
        /// Stored value.
        value: String,
    },
    /// Deletes a key if present.
    Remove {
        /// Storage key.
        key: String,
    },
}

/// Port for the durable client-side key/value store backing the session.
///
/// Calls are synchronous and local; adapters must not perform network I/O.
pub trait SessionStorage: Send + Sync {
    /// Reads several keys from one consistent snapshot, in `keys` order.
    fn read_many(&self, keys: &[&str]) -> AppResult<Vec<Option<String>>>;

    /// Reads one key.
    fn read(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.read_many(&[key])?.into_iter().next().flatten())
    }

    /// Applies every write in the batch, or none of them.
    fn apply(&self, batch: Vec<StorageWrite>) -> AppResult<()>;
}

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use admanager_application::{SessionStorage, StorageWrite};
use admanager_core::AppResult;

/// Process-local session storage, lost on exit.
#[derive(Default)]
pub struct InMemorySessionStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemorySessionStorage {
    /// Creates empty in-memory storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for InMemorySessionStorage {
    fn read_many(&self, keys: &[&str]) -> AppResult<Vec<Option<String>>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(keys.iter().map(|key| entries.get(*key).cloned()).collect())
    }

    fn apply(&self, writes: Vec<StorageWrite>) -> AppResult<()> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for write in writes {
            match write {
                StorageWrite::Put { key, value } => {
                    entries.insert(key, value);
                }
                StorageWrite::Remove { key } => {
                    entries.remove(&key);
                }
            }
        }

        Ok(())
    }
}

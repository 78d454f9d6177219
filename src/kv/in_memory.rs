//! InMemoryKeyValueStore - HashMap-backed slots for testing and embedding.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{KeyValueStore, KvError};

/// In-memory key/value store backed by a HashMap.
///
/// Clone-friendly via Arc: clones share the same slots, so a test can keep a
/// handle and inspect what the catalog wrote.
#[derive(Clone)]
pub struct InMemoryKeyValueStore {
    storage: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl Default for InMemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryKeyValueStore {
    /// Create a new empty store with no quota.
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
            quota: None,
        }
    }

    /// Limit the total size of all keys and values, in bytes.
    ///
    /// Writes that would push the total over the limit fail with
    /// [`KvError::QuotaExceeded`] and leave the slot untouched.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// Total bytes currently held (keys plus values).
    pub fn used_bytes(&self) -> Result<usize, KvError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| KvError::LockPoisoned("usage read"))?;
        Ok(storage.iter().map(|(k, v)| k.len() + v.len()).sum())
    }

    /// Number of populated slots.
    pub fn len(&self) -> Result<usize, KvError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| KvError::LockPoisoned("len read"))?;
        Ok(storage.len())
    }

    pub fn is_empty(&self) -> Result<bool, KvError> {
        Ok(self.len()? == 0)
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, KvError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| KvError::LockPoisoned("read"))?;
        Ok(storage.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KvError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| KvError::LockPoisoned("write"))?;

        if let Some(limit) = self.quota {
            let used: usize = storage
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > limit {
                return Err(KvError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        storage.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<bool, KvError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| KvError::LockPoisoned("remove"))?;
        Ok(storage.remove(key).is_some())
    }
}

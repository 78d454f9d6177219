//! Key/value slots - the durable string storage the catalog persists into.
//!
//! A backend maps fixed slot keys to UTF-8 string values, the way browser
//! local storage does. The catalog only needs three operations: read a slot,
//! overwrite a slot, and erase a slot.
//!
//! ## Example
//!
//! ```ignore
//! use zyren_catalog::{InMemoryKeyValueStore, KeyValueStore};
//!
//! let kv = InMemoryKeyValueStore::new();
//! kv.set_item("catalog-primary", "[]")?;
//! assert_eq!(kv.get_item("catalog-primary")?.as_deref(), Some("[]"));
//! ```

mod file;
mod in_memory;

use std::fmt;

/// Error type for key/value slot operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KvError {
    /// The lock guarding the backend was poisoned.
    LockPoisoned(&'static str),
    /// Writing the value would exceed the backend's byte quota.
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },
    /// The key contains characters the backend cannot address.
    InvalidKey(String),
    /// Filesystem or other I/O failure.
    Io(String),
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KvError::LockPoisoned(operation) => {
                write!(f, "key/value lock poisoned during {}", operation)
            }
            KvError::QuotaExceeded { key, needed, limit } => write!(
                f,
                "quota exceeded writing {} ({} bytes needed, limit {})",
                key, needed, limit
            ),
            KvError::InvalidKey(key) => write!(f, "invalid storage key: {:?}", key),
            KvError::Io(msg) => write!(f, "key/value io error: {}", msg),
        }
    }
}

impl std::error::Error for KvError {}

/// Durable string slots addressed by key.
pub trait KeyValueStore: Send + Sync {
    /// Read a slot. Returns None if the slot was never written or was removed.
    fn get_item(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Overwrite a slot with `value`.
    fn set_item(&self, key: &str, value: &str) -> Result<(), KvError>;

    /// Erase a slot. Returns true if it existed.
    fn remove_item(&self, key: &str) -> Result<bool, KvError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get_item(&self, key: &str) -> Result<Option<String>, KvError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), KvError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<bool, KvError> {
        (**self).remove_item(key)
    }
}

pub use file::FileKeyValueStore;
pub use in_memory::InMemoryKeyValueStore;

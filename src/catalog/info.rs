use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::CatalogStore;
use crate::clock::Clock;
use crate::kv::KeyValueStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CacheStatus {
    Active,
    Empty,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheStatus::Active => write!(f, "Active"),
            CacheStatus::Empty => write!(f, "Empty"),
        }
    }
}

/// Read-only diagnostic snapshot for the admin page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    /// Records in the cache (0 when the cache is not populated).
    pub total_products: usize,
    /// Size of the primary slot, in bytes.
    pub storage_size: usize,
    /// Human-readable time of the last successful save.
    pub last_sync: Option<String>,
    pub cache_status: CacheStatus,
}

impl<S: KeyValueStore, C: Clock> CatalogStore<S, C> {
    pub fn storage_info(&self) -> StorageInfo {
        let storage_size = self
            .storage
            .get_item(&self.config.primary_key)
            .ok()
            .flatten()
            .map_or(0, |data| data.len());

        StorageInfo {
            total_products: self.cache.as_ref().map_or(0, Vec::len),
            storage_size,
            last_sync: self
                .last_sync()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
            cache_status: if self.cache.is_some() {
                CacheStatus::Active
            } else {
                CacheStatus::Empty
            },
        }
    }

    /// Time of the last successful save, from the last-sync slot.
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        let raw = self.storage.get_item(&self.config.sync_key).ok().flatten()?;
        let millis = raw.trim().parse::<i64>().ok()?;
        DateTime::from_timestamp_millis(millis)
    }
}

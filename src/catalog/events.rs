//! Change notifications for UI layers that need to re-fetch after a mutation.

use serde::{Deserialize, Serialize};

use crate::product::ProductId;

/// Event name every catalog notification is emitted under.
pub const CATALOG_CHANGED: &str = "catalog:changed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CatalogEvent {
    Saved { count: usize },
    Added { id: ProductId },
    Updated { id: ProductId },
    Deleted { id: ProductId },
    Cleared,
    Imported { count: usize },
}

impl CatalogEvent {
    /// JSON payload carried by the emitted event.
    pub fn to_payload(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn from_payload(payload: &str) -> Option<Self> {
        serde_json::from_str(payload).ok()
    }
}

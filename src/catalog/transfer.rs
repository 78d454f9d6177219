//! Import/export of the catalog as a JSON document, for moving a catalog
//! between devices.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::{CatalogEvent, CatalogStore};
use crate::clock::Clock;
use crate::error::CatalogError;
use crate::kv::KeyValueStore;
use crate::product::{iso_millis, screen, Product};

/// Format tag written into every export.
pub const EXPORT_VERSION: &str = "3.0";

/// `{ products, exportDate, version }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub products: Vec<Product>,
    pub export_date: String,
    pub version: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub rejected: usize,
}

impl<S: KeyValueStore, C: Clock> CatalogStore<S, C> {
    pub fn export_snapshot(&mut self) -> ExportSnapshot {
        ExportSnapshot {
            products: self.load(),
            export_date: iso_millis::format(&self.clock.now()),
            version: EXPORT_VERSION.to_string(),
        }
    }

    /// The current catalog as a pretty-printed export document.
    pub fn export_data(&mut self) -> Result<String, CatalogError> {
        let snapshot = self.export_snapshot();
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Replace the catalog with the valid records of an export document.
    ///
    /// Only `products` is read. Invalid records and repeated ids are dropped;
    /// if nothing valid remains the catalog is left untouched.
    pub fn import_data(&mut self, json: &str) -> Result<ImportReport, CatalogError> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| CatalogError::InvalidImport(e.to_string()))?;
        let records = document
            .get("products")
            .and_then(Value::as_array)
            .ok_or_else(|| CatalogError::InvalidImport("missing `products` array".into()))?;

        let screened = screen(records);
        for rejection in &screened.rejected {
            debug!(index = rejection.index, reason = %rejection.reason, "import record rejected");
        }

        let rejected = screened.rejected.len();
        if screened.valid.is_empty() {
            return Err(CatalogError::NoValidProducts { rejected });
        }

        let imported = screened.valid.len();
        self.persist(screened.valid)?;

        info!(imported, rejected, "catalog imported");
        self.notify(CatalogEvent::Imported { count: imported });
        Ok(ImportReport { imported, rejected })
    }
}

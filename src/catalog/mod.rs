//! Catalog store - durable, verified persistence of the product list.
//!
//! The store owns three key/value slots (primary, backup, last-sync), an
//! in-memory cache of the last known-good catalog and an initialization flag.
//! Every write follows the same protocol:
//!
//! 1. stamp each record (`createdAt` kept or set, `updatedAt` refreshed)
//! 2. copy the current primary slot into the backup slot
//! 3. write the serialized catalog to the primary slot
//! 4. read the primary slot back and compare it with what was written
//! 5. on success refresh the cache and the last-sync marker; on failure put
//!    the backup back into the primary slot and leave the cache alone
//!
//! ## Example
//!
//! ```ignore
//! use zyren_catalog::{CatalogStore, InMemoryKeyValueStore, NewProduct};
//!
//! let mut store = CatalogStore::new(InMemoryKeyValueStore::new());
//! let cap = store.add(NewProduct::new("Training Cap", 24.0, "Accessories"))?;
//! store.delete(cap.id)?;
//! ```

mod config;
mod delete;
mod events;
mod info;
mod transfer;

use chrono::{DateTime, Duration, SubsecRound, Utc};
#[cfg(feature = "emitter")]
use event_emitter_rs::EventEmitter;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::CatalogError;
use crate::kv::KeyValueStore;
use crate::product::{default_products, screen, NewProduct, Product, ProductId, ProductPatch};

pub use config::{CatalogConfig, DEFAULT_BACKUP_KEY, DEFAULT_PRIMARY_KEY, DEFAULT_SYNC_KEY};
pub use events::{CatalogEvent, CATALOG_CHANGED};
pub use info::{CacheStatus, StorageInfo};
pub use transfer::{ExportSnapshot, ImportReport, EXPORT_VERSION};

/// What a slot held when it was read.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SlotRead {
    Missing,
    /// Unparseable, not an array, or an array in which no record validated.
    Unreadable,
    /// The valid records. Empty only when the slot holds an empty array.
    Records(Vec<Product>),
}

/// The catalog store. Construct once per session and hand `&mut` access to
/// the UI layer; callers never hold an authoritative copy and re-fetch with
/// [`load`](Self::load) after a mutation.
pub struct CatalogStore<S, C = SystemClock> {
    storage: S,
    clock: C,
    config: CatalogConfig,
    cache: Option<Vec<Product>>,
    initialized: bool,
    last_stamp: Option<DateTime<Utc>>,
    #[cfg(feature = "emitter")]
    emitter: EventEmitter,
}

impl<S: KeyValueStore> CatalogStore<S, SystemClock> {
    /// A store over `storage` with the default config and the system clock.
    pub fn new(storage: S) -> Self {
        CatalogStore {
            storage,
            clock: SystemClock,
            config: CatalogConfig::default(),
            cache: None,
            initialized: false,
            last_stamp: None,
            #[cfg(feature = "emitter")]
            emitter: EventEmitter::new(),
        }
    }
}

impl<S: KeyValueStore, C: Clock> CatalogStore<S, C> {
    pub fn with_config(mut self, config: CatalogConfig) -> Result<Self, CatalogError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> CatalogStore<S, C2> {
        CatalogStore {
            storage: self.storage,
            clock,
            config: self.config,
            cache: self.cache,
            initialized: self.initialized,
            last_stamp: self.last_stamp,
            #[cfg(feature = "emitter")]
            emitter: self.emitter,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register a listener for [`CATALOG_CHANGED`]. The payload is a
    /// JSON-encoded [`CatalogEvent`]; listeners run on emitter threads.
    #[cfg(feature = "emitter")]
    pub fn on_change<F>(&mut self, listener: F) -> String
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        self.emitter.on(CATALOG_CHANGED, listener)
    }

    /// One-time setup: primary slot, then backup slot, then seeded defaults.
    ///
    /// Never fails. If even seeding cannot be persisted the defaults are kept
    /// in memory so the storefront can still render.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        let products = match self.recover() {
            Some(products) => products,
            None if self.config.seed_defaults => {
                let now = self.clock.now();
                let defaults = default_products(now);
                match self.persist(defaults.clone()) {
                    Ok(saved) => saved,
                    Err(err) => {
                        error!(error = %err, "could not persist default catalog, serving it from memory");
                        defaults
                    }
                }
            }
            None => Vec::new(),
        };

        info!(count = products.len(), "catalog initialized");
        self.cache = Some(products);
        self.initialized = true;
    }

    /// The current catalog. Returns a copy; mutating it does not touch the store.
    pub fn load(&mut self) -> Vec<Product> {
        self.initialize();

        if let Some(cache) = &self.cache {
            return cache.clone();
        }

        let products = match self.recover() {
            Some(products) => products,
            None if self.config.seed_defaults => default_products(self.clock.now()),
            None => Vec::new(),
        };
        self.cache = Some(products.clone());
        products
    }

    pub fn get(&mut self, id: ProductId) -> Option<Product> {
        self.load().into_iter().find(|p| p.id == id)
    }

    /// Overwrite the whole catalog. Returns the stamped records as persisted.
    pub fn save(&mut self, products: Vec<Product>) -> Result<Vec<Product>, CatalogError> {
        let saved = self.persist(products)?;
        self.notify(CatalogEvent::Saved { count: saved.len() });
        Ok(saved)
    }

    /// Create a product with the next free id (`max(ids) + 1`, or 1 when empty).
    pub fn add(&mut self, data: NewProduct) -> Result<Product, CatalogError> {
        data.validate()?;

        let mut products = self.load();
        let id = products
            .iter()
            .map(|p| p.id)
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| CatalogError::InvalidProduct("product id space exhausted".into()))?;

        let mut product = Product::from_new(id, data, self.clock.now());
        // The save pass assigns both timestamps from one stamp.
        product.created_at = None;
        product.updated_at = None;
        products.push(product);

        let saved = self.persist(products)?;
        let created = saved
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(CatalogError::NotFound { id })?;

        info!(id, name = %created.name, "product added");
        self.notify(CatalogEvent::Added { id });
        Ok(created)
    }

    /// Merge `patch` over the product with `id`. Id and `createdAt` never change.
    pub fn update(&mut self, id: ProductId, patch: ProductPatch) -> Result<Product, CatalogError> {
        patch.validate()?;

        let mut products = self.load();
        let Some(product) = products.iter_mut().find(|p| p.id == id) else {
            warn!(id, "update of unknown product");
            return Err(CatalogError::NotFound { id });
        };
        patch.apply_to(product);

        let saved = self.persist(products)?;
        let updated = saved
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(CatalogError::NotFound { id })?;

        debug!(id, "product updated");
        self.notify(CatalogEvent::Updated { id });
        Ok(updated)
    }

    pub fn toggle_featured(&mut self, id: ProductId) -> Result<Product, CatalogError> {
        let current = self.get(id).ok_or(CatalogError::NotFound { id })?;
        self.update(id, ProductPatch::new().featured(!current.featured))
    }

    pub fn toggle_stock(&mut self, id: ProductId) -> Result<Product, CatalogError> {
        let current = self.get(id).ok_or(CatalogError::NotFound { id })?;
        self.update(id, ProductPatch::new().in_stock(!current.in_stock))
    }

    /// Replace the catalog with the seeded default products.
    pub fn reset_to_defaults(&mut self) -> Result<Vec<Product>, CatalogError> {
        let defaults = default_products(self.clock.now());
        let saved = self.persist(defaults)?;
        info!("catalog reset to defaults");
        self.notify(CatalogEvent::Saved { count: saved.len() });
        Ok(saved)
    }

    /// Erase all three slots and return the store to its uninitialized state.
    ///
    /// Every slot is attempted even if an earlier removal fails; the first
    /// error is returned.
    pub fn clear_all(&mut self) -> Result<(), CatalogError> {
        let keys = [
            self.config.primary_key.clone(),
            self.config.backup_key.clone(),
            self.config.sync_key.clone(),
        ];
        let mut first_err = None;
        for key in &keys {
            if let Err(err) = self.storage.remove_item(key) {
                error!(key = %key, error = %err, "failed to clear slot");
                first_err.get_or_insert(err);
            }
        }

        self.cache = None;
        self.initialized = false;

        match first_err {
            Some(err) => Err(err.into()),
            None => {
                info!("catalog cleared");
                self.notify(CatalogEvent::Cleared);
                Ok(())
            }
        }
    }

    /// Drop the cached catalog; the next `load` re-reads the slots.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
    }

    /// Discard cache and initialization state, then load from storage.
    pub fn force_refresh(&mut self) -> Vec<Product> {
        self.cache = None;
        self.initialized = false;
        self.load()
    }

    /// Stamp and write `products` with the verified write protocol.
    pub(crate) fn persist(&mut self, products: Vec<Product>) -> Result<Vec<Product>, CatalogError> {
        let now = self.stamp();
        let stamped: Vec<Product> = products.into_iter().map(|p| p.stamped(now)).collect();

        match self.write_verified(&stamped) {
            Ok(bytes) => {
                self.cache = Some(stamped.clone());
                let marker = now.timestamp_millis().to_string();
                if let Err(err) = self.storage.set_item(&self.config.sync_key, &marker) {
                    warn!(error = %err, "failed to record last sync time");
                }
                debug!(count = stamped.len(), bytes, "catalog saved");
                Ok(stamped)
            }
            Err(err) => {
                error!(error = %err, "catalog save failed");
                self.restore_primary_from_backup();
                Err(err)
            }
        }
    }

    fn write_verified(&self, products: &[Product]) -> Result<usize, CatalogError> {
        let primary = &self.config.primary_key;

        match self.storage.get_item(primary) {
            Ok(Some(current)) => {
                if let Err(err) = self.storage.set_item(&self.config.backup_key, &current) {
                    warn!(error = %err, "could not snapshot primary slot to backup");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "could not read primary slot for backup"),
        }

        let payload = serde_json::to_string(products)?;
        self.storage.set_item(primary, &payload)?;

        let readback = self.storage.get_item(primary)?;
        if readback.as_deref() != Some(payload.as_str()) {
            return Err(CatalogError::VerificationFailed {
                key: primary.clone(),
            });
        }
        Ok(payload.len())
    }

    fn restore_primary_from_backup(&self) {
        match self.storage.get_item(&self.config.backup_key) {
            Ok(Some(backup)) => match self.storage.set_item(&self.config.primary_key, &backup) {
                Ok(()) => info!("restored primary slot from backup after save failure"),
                Err(err) => error!(error = %err, "backup restore also failed"),
            },
            Ok(None) => {}
            Err(err) => error!(error = %err, "could not read backup slot for restore"),
        }
    }

    /// Primary slot if it holds a catalog, otherwise a non-empty backup.
    fn recover(&self) -> Option<Vec<Product>> {
        if let SlotRead::Records(products) = self.read_slot(&self.config.primary_key) {
            return Some(products);
        }

        match self.read_slot(&self.config.backup_key) {
            SlotRead::Records(products) if !products.is_empty() => {
                info!(count = products.len(), "loaded catalog from backup slot");
                Some(products)
            }
            _ => None,
        }
    }

    pub(crate) fn read_slot(&self, key: &str) -> SlotRead {
        let raw = match self.storage.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return SlotRead::Missing,
            Err(err) => {
                error!(key, error = %err, "failed to read catalog slot");
                return SlotRead::Unreadable;
            }
        };

        let records = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(records)) => records,
            Ok(_) => {
                warn!(key, "catalog slot does not hold an array");
                return SlotRead::Unreadable;
            }
            Err(err) => {
                error!(key, error = %err, "catalog slot is not valid JSON");
                return SlotRead::Unreadable;
            }
        };

        let screened = screen(&records);
        if !screened.rejected.is_empty() {
            warn!(
                key,
                dropped = screened.rejected.len(),
                "filtered out invalid products"
            );
        }
        if screened.valid.is_empty() && !records.is_empty() {
            return SlotRead::Unreadable;
        }
        SlotRead::Records(screened.valid)
    }

    /// Next stamp: the current time at millisecond precision, bumped past the
    /// previous stamp of this session when the clock has not moved on.
    /// Timestamps already on the records never push it forward.
    fn stamp(&mut self) -> DateTime<Utc> {
        let mut now = self.clock.now().trunc_subsecs(3);
        if let Some(last) = self.last_stamp {
            if now <= last {
                now = last + Duration::milliseconds(1);
            }
        }
        self.last_stamp = Some(now);
        now
    }

    fn notify(&mut self, event: CatalogEvent) {
        debug!(?event, "catalog changed");
        #[cfg(feature = "emitter")]
        self.emitter.emit(CATALOG_CHANGED, event.to_payload());
    }
}

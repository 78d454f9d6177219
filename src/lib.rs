mod admin;
mod catalog;
mod clock;
mod error;
mod kv;
mod order;
pub mod product;
mod query;

pub use admin::AdminGate;
pub use catalog::{
    CacheStatus, CatalogConfig, CatalogEvent, CatalogStore, ExportSnapshot, ImportReport,
    StorageInfo, CATALOG_CHANGED, DEFAULT_BACKUP_KEY, DEFAULT_PRIMARY_KEY, DEFAULT_SYNC_KEY,
    EXPORT_VERSION,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::CatalogError;
pub use kv::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, KvError};
pub use order::{whatsapp_link, OrderRequest};
pub use product::{NewProduct, Product, ProductId, ProductPatch, CATEGORIES};
pub use query::{ProductQuery, ALL_CATEGORIES};

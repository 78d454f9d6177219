use std::fmt;

use crate::kv::KvError;
use crate::product::ProductId;

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogError {
    /// A key/value slot could not be read, written, or erased.
    Storage(KvError),
    /// The catalog could not be serialized or a document could not be parsed.
    Serde(String),
    /// The primary slot did not read back what was just written.
    VerificationFailed { key: String },
    NotFound { id: ProductId },
    /// New product data or a patch would produce an invalid record.
    InvalidProduct(String),
    /// The import document is not shaped like an export.
    InvalidImport(String),
    NoValidProducts { rejected: usize },
    /// The deleted id was still visible after every allowed attempt.
    DeleteUnverified { id: ProductId, attempts: u32 },
    Config(String),
    /// An order hand-off link could not be built.
    Link(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Storage(err) => write!(f, "catalog storage error: {}", err),
            CatalogError::Serde(msg) => write!(f, "catalog serialization error: {}", msg),
            CatalogError::VerificationFailed { key } => {
                write!(f, "save verification failed for slot {}", key)
            }
            CatalogError::NotFound { id } => write!(f, "product {} not found", id),
            CatalogError::InvalidProduct(msg) => write!(f, "invalid product: {}", msg),
            CatalogError::InvalidImport(msg) => write!(f, "invalid import data: {}", msg),
            CatalogError::NoValidProducts { rejected } => write!(
                f,
                "no valid products found in import data ({} rejected)",
                rejected
            ),
            CatalogError::DeleteUnverified { id, attempts } => write!(
                f,
                "product {} still present after {} delete attempts",
                id, attempts
            ),
            CatalogError::Config(msg) => write!(f, "invalid catalog config: {}", msg),
            CatalogError::Link(msg) => write!(f, "could not build order link: {}", msg),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<KvError> for CatalogError {
    fn from(err: KvError) -> Self {
        CatalogError::Storage(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Serde(err.to_string())
    }
}

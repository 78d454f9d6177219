//! Verified delete.
//!
//! A delete is a bounded write-verify-retry loop. Each round writes a catalog
//! without the id and then checks that the id is gone from both the freshly
//! read primary slot and the cache. Later rounds rebuild their input from
//! whatever the primary slot currently holds, stripped of the id.
//!
//! ```text
//! Attempting(n) --saved--> Verifying(n) --absent--> Succeeded
//!      |                        |
//!      +--error--> Retrying(n) <+--present
//!                     |
//!          n < max: Attempting(n+1)    n == max: Failed
//! ```

use std::thread;

use tracing::{error, info, warn};

use super::{CatalogEvent, CatalogStore, SlotRead};
use crate::clock::Clock;
use crate::error::CatalogError;
use crate::kv::KeyValueStore;
use crate::product::{Product, ProductId};

#[derive(Debug, Clone, PartialEq)]
enum DeletePhase {
    Attempting { attempt: u32 },
    Verifying { attempt: u32 },
    Retrying { attempt: u32, cause: CatalogError },
    Succeeded { attempt: u32 },
    Failed(CatalogError),
}

impl<S: KeyValueStore, C: Clock> CatalogStore<S, C> {
    /// Remove the product with `id`.
    ///
    /// After `Ok(())` no later `load` returns a record with that id. Unknown
    /// ids fail with `NotFound` and write nothing.
    pub fn delete(&mut self, id: ProductId) -> Result<(), CatalogError> {
        let products = self.load();
        let initial_count = products.len();
        if !products.iter().any(|p| p.id == id) {
            warn!(id, "delete of unknown product");
            return Err(CatalogError::NotFound { id });
        }
        let remaining: Vec<Product> = products.into_iter().filter(|p| p.id != id).collect();

        let max_attempts = self.config.delete_attempts;
        let mut phase = DeletePhase::Attempting { attempt: 1 };

        loop {
            phase = match phase {
                DeletePhase::Attempting { attempt } => {
                    let target = if attempt == 1 {
                        remaining.clone()
                    } else {
                        self.corrective_target(id, &remaining)
                    };
                    match self.persist(target) {
                        Ok(_) => DeletePhase::Verifying { attempt },
                        Err(cause) => DeletePhase::Retrying { attempt, cause },
                    }
                }
                DeletePhase::Verifying { attempt } => {
                    if self.is_absent(id) {
                        DeletePhase::Succeeded { attempt }
                    } else {
                        DeletePhase::Retrying {
                            attempt,
                            cause: CatalogError::DeleteUnverified {
                                id,
                                attempts: attempt,
                            },
                        }
                    }
                }
                DeletePhase::Retrying { attempt, cause } => {
                    if attempt >= max_attempts {
                        DeletePhase::Failed(cause)
                    } else {
                        warn!(id, attempt, error = %cause, "delete not confirmed, retrying");
                        let backoff = self.config.retry_backoff();
                        if !backoff.is_zero() {
                            thread::sleep(backoff);
                        }
                        DeletePhase::Attempting {
                            attempt: attempt + 1,
                        }
                    }
                }
                DeletePhase::Succeeded { attempt } => {
                    info!(
                        id,
                        attempt,
                        before = initial_count,
                        after = initial_count - 1,
                        "product deleted"
                    );
                    self.notify(CatalogEvent::Deleted { id });
                    return Ok(());
                }
                DeletePhase::Failed(cause) => {
                    error!(id, attempts = max_attempts, error = %cause, "delete failed");
                    return Err(cause);
                }
            };
        }
    }

    /// Whatever the primary slot holds now, minus `id`. Falls back to the
    /// filtered catalog computed before the first round.
    fn corrective_target(&self, id: ProductId, remaining: &[Product]) -> Vec<Product> {
        match self.read_slot(&self.config.primary_key) {
            SlotRead::Records(products) => products.into_iter().filter(|p| p.id != id).collect(),
            _ => remaining.to_vec(),
        }
    }

    /// The id is gone from the primary slot and from the cache.
    ///
    /// A missing or unreadable primary slot does not count: `load` would fall
    /// back to the backup, which still holds the id.
    fn is_absent(&self, id: ProductId) -> bool {
        let in_primary = match self.read_slot(&self.config.primary_key) {
            SlotRead::Records(products) => products.iter().any(|p| p.id == id),
            SlotRead::Missing | SlotRead::Unreadable => true,
        };
        let in_cache = self
            .cache
            .as_ref()
            .map_or(true, |cache| cache.iter().any(|p| p.id == id));
        !in_primary && !in_cache
    }
}

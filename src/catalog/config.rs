use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

pub const DEFAULT_PRIMARY_KEY: &str = "catalog-primary";
pub const DEFAULT_BACKUP_KEY: &str = "catalog-backup";
pub const DEFAULT_SYNC_KEY: &str = "catalog-last-sync";

/// Slot keys and retry policy for a [`CatalogStore`](super::CatalogStore).
///
/// Every field has a default, so a JSON config only needs the fields it changes:
///
/// ```ignore
/// let config = CatalogConfig::from_json(r#"{ "deleteAttempts": 5 }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogConfig {
    pub primary_key: String,
    pub backup_key: String,
    pub sync_key: String,
    /// Upper bound on write-verify rounds in `delete`.
    pub delete_attempts: u32,
    /// Pause between delete rounds, in milliseconds.
    pub retry_backoff_ms: u64,
    /// Seed the default products when no stored catalog exists.
    pub seed_defaults: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            backup_key: DEFAULT_BACKUP_KEY.to_string(),
            sync_key: DEFAULT_SYNC_KEY.to_string(),
            delete_attempts: 3,
            retry_backoff_ms: 25,
            seed_defaults: true,
        }
    }
}

impl CatalogConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let config: CatalogConfig =
            serde_json::from_str(json).map_err(|e| CatalogError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Derive all three slot keys from a common prefix.
    pub fn with_namespace(mut self, prefix: &str) -> Self {
        self.primary_key = format!("{}-primary", prefix);
        self.backup_key = format!("{}-backup", prefix);
        self.sync_key = format!("{}-last-sync", prefix);
        self
    }

    pub fn with_delete_attempts(mut self, attempts: u32) -> Self {
        self.delete_attempts = attempts;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff_ms = backoff.as_millis() as u64;
        self
    }

    pub fn with_seed_defaults(mut self, seed: bool) -> Self {
        self.seed_defaults = seed;
        self
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.delete_attempts == 0 {
            return Err(CatalogError::Config(
                "deleteAttempts must be at least 1".into(),
            ));
        }
        let keys = [&self.primary_key, &self.backup_key, &self.sync_key];
        if keys.iter().any(|k| k.is_empty()) {
            return Err(CatalogError::Config("slot keys must not be empty".into()));
        }
        if keys[0] == keys[1] || keys[0] == keys[2] || keys[1] == keys[2] {
            return Err(CatalogError::Config("slot keys must be distinct".into()));
        }
        Ok(())
    }
}

use async_trait::async_trait;
use thiserror::Error;

use crate::sites::model::SiteConfig;
use crate::urls::Domain;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt record for '{key}': {reason}")]
    Corrupt { key: String, reason: String },
}

/// Per-domain extraction rules, keyed by normalized [`Domain`].
///
/// Writes replace the whole record for a domain at once, so a concurrent
/// reader sees either the old or the new config, never a mix.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SiteConfigStore: Send + Sync {
    async fn get(&self, domain: &Domain) -> Result<Option<SiteConfig>, StoreError>;

    /// Insert or replace; `updated_at` is set to now.
    async fn put(&self, config: SiteConfig) -> Result<SiteConfig, StoreError>;

    async fn delete(&self, domain: &Domain) -> Result<bool, StoreError>;

    /// All configs ordered by domain.
    async fn list(&self) -> Result<Vec<SiteConfig>, StoreError>;

    /// Cheap liveness probe for health checks.
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

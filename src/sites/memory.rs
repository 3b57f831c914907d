use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;

use crate::sites::{
    model::SiteConfig,
    store::{SiteConfigStore, StoreError},
};
use crate::urls::Domain;

/// Process-local store, mostly for tests.
#[derive(Clone, Default)]
pub struct InMemorySiteConfigStore {
    configs: Arc<DashMap<Domain, SiteConfig>>,
}

impl InMemorySiteConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configs(configs: impl IntoIterator<Item = SiteConfig>) -> Self {
        let store = Self::new();
        for config in configs {
            store.configs.insert(config.domain.clone(), config);
        }
        store
    }
}

#[async_trait]
impl SiteConfigStore for InMemorySiteConfigStore {
    async fn get(&self, domain: &Domain) -> Result<Option<SiteConfig>, StoreError> {
        Ok(self.configs.get(domain).map(|entry| entry.value().clone()))
    }

    async fn put(&self, mut config: SiteConfig) -> Result<SiteConfig, StoreError> {
        config.updated_at = Utc::now();
        self.configs.insert(config.domain.clone(), config.clone());
        Ok(config)
    }

    async fn delete(&self, domain: &Domain) -> Result<bool, StoreError> {
        Ok(self.configs.remove(domain).is_some())
    }

    async fn list(&self) -> Result<Vec<SiteConfig>, StoreError> {
        let mut configs: Vec<SiteConfig> =
            self.configs.iter().map(|entry| entry.value().clone()).collect();
        configs.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(configs)
    }
}

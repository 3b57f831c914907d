//! JSON file store.
//!
//! The file maps each domain to its crawler and selector instructions:
//!
//! ```json
//! {
//!   "example.org": {
//!     "crawler": "js",
//!     "instructions": { "include": "#main", "exclude": "nav, footer", "wait": ".listing" },
//!     "updatedAt": "2025-01-01T00:00:00Z"
//!   }
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::extractor::ExtractionRules;
use crate::fetcher::FetchMode;
use crate::sites::{
    model::SiteConfig,
    store::{SiteConfigStore, StoreError},
};
use crate::urls::Domain;

#[derive(Debug, Serialize, Deserialize)]
struct FileEntry {
    crawler: String,
    #[serde(default)]
    instructions: FileInstructions,
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct FileInstructions {
    #[serde(default)]
    include: String,
    #[serde(default)]
    exclude: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    wait: Option<String>,
}

impl From<&SiteConfig> for FileEntry {
    fn from(config: &SiteConfig) -> Self {
        Self {
            crawler: config.fetch_mode.crawler_name().to_string(),
            instructions: FileInstructions {
                include: config.include_selector.clone(),
                exclude: config.exclude_selector.clone(),
                wait: config.wait_selector.clone(),
            },
            updated_at: Some(config.updated_at),
        }
    }
}

impl FileEntry {
    fn into_config(self, key: &str) -> Result<SiteConfig, StoreError> {
        let corrupt = |reason: String| StoreError::Corrupt {
            key: key.to_string(),
            reason,
        };
        let domain = Domain::parse(key).map_err(|e| corrupt(e.to_string()))?;
        let fetch_mode = FetchMode::from_crawler_name(&self.crawler)
            .ok_or_else(|| corrupt(format!("unknown crawler '{}'", self.crawler)))?;

        let mut config = SiteConfig::new(
            domain,
            fetch_mode,
            ExtractionRules::new(self.instructions.include, self.instructions.exclude),
        );
        config.wait_selector = self.instructions.wait;
        if let Some(updated_at) = self.updated_at {
            config.updated_at = updated_at;
        }
        Ok(config)
    }
}

/// Site configs persisted to a single JSON file.
///
/// The whole file is held in memory; every write rewrites it through a temp
/// file and a rename, under the write lock.
pub struct JsonFileSiteConfigStore {
    path: PathBuf,
    configs: RwLock<BTreeMap<Domain, SiteConfig>>,
}

impl JsonFileSiteConfigStore {
    /// Load `path`, starting empty if it does not exist yet.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let configs = match tokio::fs::read_to_string(&path).await {
            Ok(content) => parse(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "site config file missing, starting empty");
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), count = configs.len(), "site configs loaded");

        Ok(Self {
            path,
            configs: RwLock::new(configs),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn parse(content: &str) -> Result<BTreeMap<Domain, SiteConfig>, StoreError> {
    if content.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    let raw: BTreeMap<String, FileEntry> = serde_json::from_str(content)?;
    raw.into_iter()
        .map(|(key, entry)| {
            let config = entry.into_config(&key)?;
            Ok((config.domain.clone(), config))
        })
        .collect()
}

/// Write to a sibling temp file, then rename over the target.
async fn save(path: &Path, configs: &BTreeMap<Domain, SiteConfig>) -> Result<(), StoreError> {
    let raw: BTreeMap<&str, FileEntry> = configs
        .iter()
        .map(|(domain, config)| (domain.as_str(), FileEntry::from(config)))
        .collect();
    let json = serde_json::to_string_pretty(&raw)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await?;
    }
    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, json).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), count = configs.len(), "site configs saved");
    Ok(())
}

#[async_trait]
impl SiteConfigStore for JsonFileSiteConfigStore {
    async fn get(&self, domain: &Domain) -> Result<Option<SiteConfig>, StoreError> {
        Ok(self.configs.read().await.get(domain).cloned())
    }

    async fn put(&self, mut config: SiteConfig) -> Result<SiteConfig, StoreError> {
        config.updated_at = Utc::now();

        let mut configs = self.configs.write().await;
        let mut next = configs.clone();
        next.insert(config.domain.clone(), config.clone());
        save(&self.path, &next).await?;
        *configs = next;

        Ok(config)
    }

    async fn delete(&self, domain: &Domain) -> Result<bool, StoreError> {
        let mut configs = self.configs.write().await;
        if !configs.contains_key(domain) {
            return Ok(false);
        }
        let mut next = configs.clone();
        next.remove(domain);
        save(&self.path, &next).await?;
        *configs = next;
        Ok(true)
    }

    async fn list(&self) -> Result<Vec<SiteConfig>, StoreError> {
        Ok(self.configs.read().await.values().cloned().collect())
    }
}

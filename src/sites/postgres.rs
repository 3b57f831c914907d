use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::fetcher::FetchMode;
use crate::sites::{
    model::SiteConfig,
    store::{SiteConfigStore, StoreError},
};
use crate::urls::Domain;

#[derive(Debug, FromRow)]
struct SiteConfigRow {
    domain: String,
    fetch_mode: String,
    include_selector: String,
    exclude_selector: String,
    wait_selector: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SiteConfigRow> for SiteConfig {
    type Error = StoreError;

    fn try_from(row: SiteConfigRow) -> Result<Self, Self::Error> {
        let domain = Domain::parse(&row.domain).map_err(|e| StoreError::Corrupt {
            key: row.domain.clone(),
            reason: e.to_string(),
        })?;
        let fetch_mode =
            FetchMode::from_crawler_name(&row.fetch_mode).ok_or_else(|| StoreError::Corrupt {
                key: row.domain.clone(),
                reason: format!("unknown fetch mode '{}'", row.fetch_mode),
            })?;

        Ok(SiteConfig {
            domain,
            fetch_mode,
            include_selector: row.include_selector,
            exclude_selector: row.exclude_selector,
            wait_selector: row.wait_selector,
            updated_at: row.updated_at,
        })
    }
}

/// Site configs in the `site_configs` table; `domain` is the primary key.
#[derive(Clone)]
pub struct PgSiteConfigStore {
    pool: PgPool,
}

impl PgSiteConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SiteConfigStore for PgSiteConfigStore {
    async fn get(&self, domain: &Domain) -> Result<Option<SiteConfig>, StoreError> {
        let row = sqlx::query_as::<_, SiteConfigRow>(
            r#"
            SELECT domain, fetch_mode, include_selector, exclude_selector, wait_selector, updated_at
            FROM site_configs
            WHERE domain = $1
            "#,
        )
        .bind(domain.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(SiteConfig::try_from).transpose()
    }

    async fn put(&self, config: SiteConfig) -> Result<SiteConfig, StoreError> {
        let row = sqlx::query_as::<_, SiteConfigRow>(
            r#"
            INSERT INTO site_configs
                  (domain, fetch_mode, include_selector, exclude_selector, wait_selector, updated_at)
            VALUES ($1,     $2,         $3,               $4,               $5,            NOW())
            ON CONFLICT (domain) DO UPDATE
              SET fetch_mode       = EXCLUDED.fetch_mode,
                  include_selector = EXCLUDED.include_selector,
                  exclude_selector = EXCLUDED.exclude_selector,
                  wait_selector    = EXCLUDED.wait_selector,
                  updated_at       = EXCLUDED.updated_at
            RETURNING domain, fetch_mode, include_selector, exclude_selector, wait_selector, updated_at
            "#,
        )
        .bind(config.domain.as_str())
        .bind(config.fetch_mode.as_str())
        .bind(&config.include_selector)
        .bind(&config.exclude_selector)
        .bind(&config.wait_selector)
        .fetch_one(&self.pool)
        .await?;

        SiteConfig::try_from(row)
    }

    async fn delete(&self, domain: &Domain) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM site_configs WHERE domain = $1")
            .bind(domain.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<SiteConfig>, StoreError> {
        let rows = sqlx::query_as::<_, SiteConfigRow>(
            r#"
            SELECT domain, fetch_mode, include_selector, exclude_selector, wait_selector, updated_at
            FROM site_configs
            ORDER BY domain
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(SiteConfig::try_from).collect()
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

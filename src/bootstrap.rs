//! Wiring shared by the binaries: pick the stores, build the fetchers and the
//! language-model collaborators from [`Config`].

use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::fetcher::{FetchError, RenderingFetcher, StaticFetcher};
use crate::llm::{NoModel, OpenAiClient, SelectorGenerator};
use crate::opportunities::{InMemoryOpportunityStore, OpportunityStore, PgOpportunityStore};
use crate::service::ExtractionService;
use crate::sites::{JsonFileSiteConfigStore, PgSiteConfigStore, SiteConfigStore, StoreError};
use crate::strategy::FetchStrategy;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("fetcher setup failed: {0}")]
    Fetcher(#[from] FetchError),

    #[error("site config store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migrations failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub struct Stores {
    pub site_configs: Arc<dyn SiteConfigStore>,
    pub opportunities: Arc<dyn OpportunityStore>,
}

/// Postgres for both when `DATABASE_URL` is set; otherwise site configs go to
/// the JSON file and saved opportunities only live as long as the process.
pub async fn open_stores(config: &Config) -> Result<Stores, BootstrapError> {
    match config.database_url() {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("using postgres stores");
            Ok(Stores {
                site_configs: Arc::new(PgSiteConfigStore::new(pool.clone())),
                opportunities: Arc::new(PgOpportunityStore::new(pool)),
            })
        }
        None => {
            let site_configs = JsonFileSiteConfigStore::open(config.site_config_path()).await?;
            info!(path = %config.site_config_path().display(), "using file site config store");
            warn!("no DATABASE_URL; saved opportunities are kept in memory only");
            Ok(Stores {
                site_configs: Arc::new(site_configs),
                opportunities: Arc::new(InMemoryOpportunityStore::new()),
            })
        }
    }
}

pub fn build_strategy(config: &Config) -> Result<FetchStrategy, BootstrapError> {
    let static_fetcher = StaticFetcher::new(config.static_fetch_timeout())?;
    let rendering_fetcher = RenderingFetcher::new(config.render_settings().clone());
    Ok(
        FetchStrategy::new(Arc::new(static_fetcher), Arc::new(rendering_fetcher))
            .with_min_content_chars(config.min_content_chars()),
    )
}

pub async fn build_service(config: &Config) -> Result<ExtractionService, BootstrapError> {
    let Stores {
        site_configs: store,
        opportunities,
    } = open_stores(config).await?;
    let strategy = build_strategy(config)?;

    let service = match config.llm() {
        Some(llm) => {
            let client = Arc::new(
                OpenAiClient::new(&llm.api_key)
                    .with_base_url(&llm.base_url)
                    .with_model(&llm.model)
                    .with_html_preview_chars(llm.html_preview_chars),
            );
            info!(model = %llm.model, "language model configured");
            ExtractionService::new(store, strategy, client.clone() as Arc<dyn SelectorGenerator>)
                .with_opportunity_extractor(client)
        }
        None => {
            warn!("no LLM API key set; selectors come from the heuristic and scraping is disabled");
            ExtractionService::new(store, strategy, Arc::new(NoModel))
        }
    };

    Ok(service
        .with_opportunity_store(opportunities)
        .with_require_site_config(config.require_site_config()))
}

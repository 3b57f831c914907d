//! The extraction pipeline as one object: site config lookup, adaptive fetch,
//! reduction, the language-model collaborators and saved opportunities.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use url::Url;

use crate::errors::ScrapeError;
use crate::extractor::{Diagnostic, ExtractionRules, reduce_with_diagnostics, run_blocking};
use crate::llm::{LlmError, OpportunityExtractor, SelectorGenerator, VolunteerOpportunity};
use crate::opportunities::{InMemoryOpportunityStore, Opportunity, OpportunityStore};
use crate::sites::{FetchInstructions, SiteConfig, SiteConfigStore};
use crate::strategy::{CleanedPage, Discovery, FetchStrategy, RulesSource, propose_rules};
use crate::urls::{Domain, normalize_url};

/// Rules proposed for HTML the caller already has.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedRules {
    pub rules: ExtractionRules,
    pub rules_source: RulesSource,
    pub cleaned_preview: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeOutcome {
    pub opportunity: VolunteerOpportunity,
    pub page: CleanedPage,
}

/// Result of a scrape-and-save; `created` is false when the URL was
/// already stored and nothing was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedOpportunity {
    pub opportunity: Opportunity,
    pub created: bool,
}

#[derive(Clone)]
pub struct ExtractionService {
    store: Arc<dyn SiteConfigStore>,
    strategy: FetchStrategy,
    selector_generator: Arc<dyn SelectorGenerator>,
    opportunity_extractor: Option<Arc<dyn OpportunityExtractor>>,
    opportunities: Arc<dyn OpportunityStore>,
    require_site_config: bool,
}

impl ExtractionService {
    pub fn new(
        store: Arc<dyn SiteConfigStore>,
        strategy: FetchStrategy,
        selector_generator: Arc<dyn SelectorGenerator>,
    ) -> Self {
        Self {
            store,
            strategy,
            selector_generator,
            opportunity_extractor: None,
            opportunities: Arc::new(InMemoryOpportunityStore::new()),
            require_site_config: false,
        }
    }

    pub fn with_opportunity_extractor(mut self, extractor: Arc<dyn OpportunityExtractor>) -> Self {
        self.opportunity_extractor = Some(extractor);
        self
    }

    /// Refuse to extract from domains without a saved config.
    pub fn with_require_site_config(mut self, required: bool) -> Self {
        self.require_site_config = required;
        self
    }

    pub fn with_opportunity_store(mut self, opportunities: Arc<dyn OpportunityStore>) -> Self {
        self.opportunities = opportunities;
        self
    }

    pub fn store(&self) -> &Arc<dyn SiteConfigStore> {
        &self.store
    }

    pub fn opportunities(&self) -> &Arc<dyn OpportunityStore> {
        &self.opportunities
    }

    /// Accept a per-request model name when it names the configured model or
    /// its family (`gpt` for `gpt-4.1-mini`). Without an extractor there is
    /// nothing to check; scraping fails later as not configured.
    pub fn check_model(&self, requested: Option<&str>) -> Result<(), ScrapeError> {
        let (Some(requested), Some(extractor)) = (requested, &self.opportunity_extractor) else {
            return Ok(());
        };
        let requested = requested.trim().to_ascii_lowercase();
        let available = extractor.model();
        let configured = available.to_ascii_lowercase();

        if requested.is_empty()
            || configured == requested
            || configured.starts_with(&format!("{requested}-"))
        {
            return Ok(());
        }

        Err(ScrapeError::UnknownModel {
            requested,
            available: available.to_string(),
        })
    }

    /// Look up the domain's config and extract cleaned text.
    #[instrument(skip(self))]
    pub async fn extract(&self, raw_url: &str) -> Result<CleanedPage, ScrapeError> {
        let url = normalize_url(raw_url)?;
        let domain = Domain::from_url(&url);
        let config = self.store.get(&domain).await?;
        self.extract_with(&url, config.as_ref()).await
    }

    /// Extract with an explicit config; `None` means the domain has none.
    pub async fn extract_with(
        &self,
        url: &Url,
        config: Option<&SiteConfig>,
    ) -> Result<CleanedPage, ScrapeError> {
        let instructions = match config {
            Some(config) => {
                info!(domain = %config.domain, mode = %config.fetch_mode, "using site config");
                config.instructions()
            }
            None if self.require_site_config => {
                return Err(ScrapeError::NoConfigForDomain(Domain::from_url(url)));
            }
            None => {
                info!(domain = %Domain::from_url(url), "no site config, using default rules");
                FetchInstructions::fallback()
            }
        };

        self.strategy.fetch_cleaned(url, &instructions).await
    }

    /// Extract and run the opportunity extractor on the cleaned text.
    #[instrument(skip(self))]
    pub async fn scrape(&self, raw_url: &str) -> Result<ScrapeOutcome, ScrapeError> {
        let page = self.extract(raw_url).await?;
        let extractor = self
            .opportunity_extractor
            .as_ref()
            .ok_or(ScrapeError::UpstreamExtractionFailed(LlmError::NotConfigured))?;

        let opportunity = extractor.extract(&page.text, &page.url).await.map_err(|e| {
            warn!(error = %e, "opportunity extraction failed");
            ScrapeError::UpstreamExtractionFailed(e)
        })?;

        Ok(ScrapeOutcome { opportunity, page })
    }

    /// Scrape a URL once and keep the result; later calls for the same URL
    /// return the stored record without fetching.
    #[instrument(skip(self))]
    pub async fn scrape_and_save(&self, raw_url: &str) -> Result<SavedOpportunity, ScrapeError> {
        let url = normalize_url(raw_url)?;
        if let Some(existing) = self.opportunities.get_by_url(&url).await? {
            info!(id = %existing.id, "url already saved, returning stored opportunity");
            return Ok(SavedOpportunity {
                opportunity: existing,
                created: false,
            });
        }

        let outcome = self.scrape(url.as_str()).await?;
        let candidate = Opportunity::from_scraped(outcome.page.url, outcome.opportunity);
        let candidate_id = candidate.id;
        let opportunity = self.opportunities.insert(candidate).await?;
        let created = opportunity.id == candidate_id;
        info!(id = %opportunity.id, created, "opportunity saved");

        Ok(SavedOpportunity {
            opportunity,
            created,
        })
    }

    #[instrument(skip(self))]
    pub async fn discover_selectors(&self, raw_url: &str) -> Result<Discovery, ScrapeError> {
        let url = normalize_url(raw_url)?;
        self.strategy
            .discover(&url, self.selector_generator.as_ref())
            .await
    }

    /// Propose rules for HTML supplied by the caller; nothing is fetched.
    #[instrument(skip(self, raw_html), fields(html_len = raw_html.len()))]
    pub async fn generate_from_html(
        &self,
        raw_url: &str,
        raw_html: &str,
    ) -> Result<GeneratedRules, ScrapeError> {
        let url = normalize_url(raw_url)?;
        let (rules, rules_source) =
            propose_rules(raw_html, &url, self.selector_generator.as_ref()).await?;
        let html = raw_html.to_string();
        let proposed = rules.clone();
        let cleaned = run_blocking(move || {
            reduce_with_diagnostics(&html, proposed.include(), proposed.exclude())
        })
        .await??;

        Ok(GeneratedRules {
            rules,
            rules_source,
            cleaned_preview: cleaned.text,
            diagnostics: cleaned.diagnostics,
        })
    }

    pub async fn save_config(&self, config: SiteConfig) -> Result<SiteConfig, ScrapeError> {
        let saved = self.store.put(config).await?;
        info!(domain = %saved.domain, mode = %saved.fetch_mode, "site config saved");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::FetchMode;
    use crate::llm::{MockOpportunityExtractor, MockSelectorGenerator};
    use crate::opportunities::MockOpportunityStore;
    use crate::sites::{InMemorySiteConfigStore, MockSiteConfigStore};
    use crate::strategy::testing::{CallLog, ScriptedFetcher, page_with_text};

    fn strategy(static_pages: Vec<String>, rendered_pages: Vec<String>) -> (FetchStrategy, CallLog) {
        let log = CallLog::default();
        let strategy = FetchStrategy::new(
            ScriptedFetcher::new(
                FetchMode::Static,
                static_pages.into_iter().map(Ok).collect(),
                log.clone(),
            ),
            ScriptedFetcher::new(
                FetchMode::Rendered,
                rendered_pages.into_iter().map(Ok).collect(),
                log.clone(),
            ),
        );
        (strategy, log)
    }

    fn opportunity() -> VolunteerOpportunity {
        VolunteerOpportunity {
            organization_name: "Riverbank Trust".into(),
            activity_type: "river cleanup".into(),
            location: "N/A".into(),
            time_slot: "Sa".into(),
            slot_availability: vec!["individual drop-in welcome".into()],
            contact_email: "N/A".into(),
            contact_number: 0,
            extra: "N/A".into(),
            tags: vec!["environment".into()],
            url: String::new(),
        }
    }

    #[tokio::test]
    async fn test_configured_rendered_domain_prefers_rendering() {
        let config = SiteConfig::new(
            Domain::parse("example.org").unwrap(),
            FetchMode::Rendered,
            ExtractionRules::new("main", "nav"),
        );
        let store = Arc::new(InMemorySiteConfigStore::with_configs([config]));
        let (strategy, log) = strategy(vec![], vec![page_with_text(600)]);
        let service = ExtractionService::new(store, strategy, Arc::new(MockSelectorGenerator::new()));

        let page = service.extract("https://WWW.example.org/roles/1").await.unwrap();

        assert_eq!(page.mode, FetchMode::Rendered);
        assert_eq!(log.lock().unwrap()[0].0, FetchMode::Rendered);
    }

    #[tokio::test]
    async fn test_missing_config_uses_default_rules() {
        let (strategy, _log) = strategy(vec![page_with_text(600)], vec![]);
        let service = ExtractionService::new(
            Arc::new(InMemorySiteConfigStore::new()),
            strategy,
            Arc::new(MockSelectorGenerator::new()),
        );

        let page = service.extract("example.org").await.unwrap();

        // nav is in the default exclude list
        assert_eq!(page.text, "x".repeat(600));
    }

    #[tokio::test]
    async fn test_missing_config_can_be_required() {
        let (strategy, log) = strategy(vec![page_with_text(600)], vec![]);
        let service = ExtractionService::new(
            Arc::new(InMemorySiteConfigStore::new()),
            strategy,
            Arc::new(MockSelectorGenerator::new()),
        )
        .with_require_site_config(true);

        let err = service.extract("https://example.org").await.unwrap_err();

        assert!(matches!(err, ScrapeError::NoConfigForDomain(ref d) if d.as_str() == "example.org"));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_never_reaches_store() {
        let (strategy, _log) = strategy(vec![], vec![]);
        let mut store = MockSiteConfigStore::new();
        store.expect_get().never();
        let service =
            ExtractionService::new(Arc::new(store), strategy, Arc::new(MockSelectorGenerator::new()));

        let err = service.extract("ftp://example.org/file").await.unwrap_err();

        assert!(matches!(err, ScrapeError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn test_scrape_sets_url_from_extractor() {
        let (strategy, _log) = strategy(vec![page_with_text(600)], vec![]);
        let mut extractor = MockOpportunityExtractor::new();
        extractor.expect_extract().times(1).returning(|text, url| {
            assert_eq!(text.len(), 600);
            let mut found = opportunity();
            found.url = url.to_string();
            Ok(found)
        });
        let service = ExtractionService::new(
            Arc::new(InMemorySiteConfigStore::new()),
            strategy,
            Arc::new(MockSelectorGenerator::new()),
        )
        .with_opportunity_extractor(Arc::new(extractor));

        let outcome = service.scrape("example.org/roles").await.unwrap();

        assert_eq!(outcome.opportunity.url, "https://example.org/roles");
        assert_eq!(outcome.page.mode, FetchMode::Static);
    }

    #[tokio::test]
    async fn test_extractor_failure_is_upstream_error() {
        let (strategy, _log) = strategy(vec![page_with_text(600)], vec![]);
        let mut extractor = MockOpportunityExtractor::new();
        extractor
            .expect_extract()
            .returning(|_, _| Err(LlmError::Api("status 500".into())));
        let service = ExtractionService::new(
            Arc::new(InMemorySiteConfigStore::new()),
            strategy,
            Arc::new(MockSelectorGenerator::new()),
        )
        .with_opportunity_extractor(Arc::new(extractor));

        let err = service.scrape("example.org").await.unwrap_err();

        assert!(matches!(err, ScrapeError::UpstreamExtractionFailed(_)));
    }

    #[tokio::test]
    async fn test_generate_from_html_previews_rules() {
        let (strategy, log) = strategy(vec![], vec![]);
        let mut generator = MockSelectorGenerator::new();
        generator
            .expect_propose()
            .returning(|_, _| Ok(ExtractionRules::new("article", "")));
        let service = ExtractionService::new(
            Arc::new(InMemorySiteConfigStore::new()),
            strategy,
            Arc::new(generator),
        );

        let generated = service
            .generate_from_html(
                "example.org",
                "<nav>Menu</nav><article><h1>Tree planting</h1><p>Sunday mornings</p></article>",
            )
            .await
            .unwrap();

        assert_eq!(generated.rules_source, RulesSource::Generated);
        assert_eq!(generated.cleaned_preview, "Tree planting\nSunday mornings");
        assert!(log.lock().unwrap().is_empty());
    }

    fn extractor_with_model(model: &str) -> MockOpportunityExtractor {
        let mut extractor = MockOpportunityExtractor::new();
        extractor.expect_model().return_const(model.to_string());
        extractor
    }

    #[tokio::test]
    async fn test_scrape_and_save_fetches_each_url_once() {
        let (strategy, log) = strategy(vec![page_with_text(600)], vec![]);
        let mut extractor = MockOpportunityExtractor::new();
        extractor.expect_extract().times(1).returning(|_, url| {
            let mut found = opportunity();
            found.url = url.to_string();
            Ok(found)
        });
        let service = ExtractionService::new(
            Arc::new(InMemorySiteConfigStore::new()),
            strategy,
            Arc::new(MockSelectorGenerator::new()),
        )
        .with_opportunity_extractor(Arc::new(extractor));

        let first = service.scrape_and_save("example.org/cleanup").await.unwrap();
        let second = service
            .scrape_and_save("HTTPS://Example.org/cleanup")
            .await
            .unwrap();

        assert!(first.created);
        assert_eq!(first.opportunity.title, "River Cleanup");
        assert!(!second.created);
        assert_eq!(second.opportunity.id, first.opportunity.id);
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scrape_and_save_store_failure_skips_fetch() {
        let (strategy, log) = strategy(vec![page_with_text(600)], vec![]);
        let mut opportunities = MockOpportunityStore::new();
        opportunities
            .expect_get_by_url()
            .returning(|_| Err(crate::sites::StoreError::Io(std::io::Error::other("down"))));
        opportunities.expect_insert().never();
        let service = ExtractionService::new(
            Arc::new(InMemorySiteConfigStore::new()),
            strategy,
            Arc::new(MockSelectorGenerator::new()),
        )
        .with_opportunity_store(Arc::new(opportunities));

        let err = service.scrape_and_save("example.org").await.unwrap_err();

        assert!(matches!(err, ScrapeError::Store(_)));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_check_model_accepts_configured_family() {
        let (strategy, _log) = strategy(vec![], vec![]);
        let service = ExtractionService::new(
            Arc::new(InMemorySiteConfigStore::new()),
            strategy,
            Arc::new(MockSelectorGenerator::new()),
        )
        .with_opportunity_extractor(Arc::new(extractor_with_model("gpt-4.1-mini")));

        assert!(service.check_model(None).is_ok());
        assert!(service.check_model(Some("gpt")).is_ok());
        assert!(service.check_model(Some("GPT-4.1-mini")).is_ok());

        let err = service.check_model(Some("gemini")).unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::UnknownModel { ref requested, ref available }
                if requested == "gemini" && available == "gpt-4.1-mini"
        ));
    }
}

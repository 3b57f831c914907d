use serde::{Deserialize, Serialize};

use crate::extractor::{Diagnostic, ExtractionRules};
use crate::fetcher::FetchMode;
use crate::llm::VolunteerOpportunity;
use crate::service::{GeneratedRules, ScrapeOutcome};
use crate::strategy::{Discovery, RulesSource};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScrapeRequest {
    pub url: String,
    /// Model name or family; must match the configured model when given.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateConfigRequest {
    pub url: String,
    pub raw_html: String,
}

impl GenerateConfigRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.raw_html.trim().is_empty() {
            return Err("raw_html must be a non-empty string".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateConfigUrlRequest {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct ScrapeResponse {
    #[serde(flatten)]
    pub opportunity: VolunteerOpportunity,
    pub fetch_mode: FetchMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl From<ScrapeOutcome> for ScrapeResponse {
    fn from(outcome: ScrapeOutcome) -> Self {
        Self {
            opportunity: outcome.opportunity,
            fetch_mode: outcome.page.mode,
            diagnostics: outcome.page.diagnostics,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateConfigResponse {
    pub selectors: ExtractionRules,
    pub source: RulesSource,
    pub cleaned_text: String,
}

impl From<GeneratedRules> for GenerateConfigResponse {
    fn from(generated: GeneratedRules) -> Self {
        Self {
            selectors: generated.rules,
            source: generated.rules_source,
            cleaned_text: generated.cleaned_preview,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateConfigUrlResponse {
    pub domain: String,
    pub selectors: ExtractionRules,
    pub source: RulesSource,
    pub cleaned_text: String,
    pub raw_text: String,
    /// `get` or `js`, ready to send back to save-config.
    pub recommended_crawler: &'static str,
    pub recommended_fetch_mode: FetchMode,
}

impl From<Discovery> for GenerateConfigUrlResponse {
    fn from(discovery: Discovery) -> Self {
        Self {
            domain: discovery.domain.to_string(),
            selectors: discovery.rules,
            source: discovery.rules_source,
            cleaned_text: discovery.cleaned_preview,
            raw_text: discovery.raw_preview,
            recommended_crawler: discovery.recommended_mode.crawler_name(),
            recommended_fetch_mode: discovery.recommended_mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_config_request_requires_html() {
        let request = GenerateConfigRequest {
            url: "https://example.org".to_string(),
            raw_html: "   ".to_string(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_scrape_request_rejects_unknown_fields() {
        let parsed: Result<ScrapeRequest, _> =
            serde_json::from_value(serde_json::json!({ "url": "example.org", "modle": "gpt" }));
        assert!(parsed.is_err());

        let parsed: ScrapeRequest =
            serde_json::from_value(serde_json::json!({ "url": "example.org", "model": "gpt" }))
                .unwrap();
        assert_eq!(parsed.model.as_deref(), Some("gpt"));
    }

    #[test]
    fn test_generate_config_request_valid() {
        let request = GenerateConfigRequest {
            url: "https://example.org".to_string(),
            raw_html: "<main>Hi</main>".to_string(),
        };
        assert!(request.validate().is_ok());
    }
}

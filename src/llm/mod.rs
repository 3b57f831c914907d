//! Language-model collaborators.
//!
//! Both traits are narrow on purpose: the pipeline hands over text and gets
//! typed data back, and never sees prompts or HTTP.

pub mod client;
pub mod errors;
pub mod types;

use async_trait::async_trait;
use url::Url;

use crate::extractor::ExtractionRules;

pub use client::{DEFAULT_BASE_URL, DEFAULT_HTML_PREVIEW_CHARS, DEFAULT_MODEL, OpenAiClient};
pub use errors::LlmError;
pub use types::VolunteerOpportunity;

/// Proposes include/exclude selectors for a page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SelectorGenerator: Send + Sync {
    async fn propose(&self, raw_html: &str, url: &Url) -> Result<ExtractionRules, LlmError>;
}

/// Turns cleaned page text into a [`VolunteerOpportunity`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OpportunityExtractor: Send + Sync {
    async fn extract(&self, text: &str, url: &Url) -> Result<VolunteerOpportunity, LlmError>;

    /// Model name requests are checked against.
    fn model(&self) -> &str;
}

/// Selector generator for deployments without an API key. Always fails with
/// [`LlmError::NotConfigured`], so discovery falls through to the heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModel;

#[async_trait]
impl SelectorGenerator for NoModel {
    async fn propose(&self, _raw_html: &str, _url: &Url) -> Result<ExtractionRules, LlmError> {
        Err(LlmError::NotConfigured)
    }
}

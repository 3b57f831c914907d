use async_trait::async_trait;
use reqwest::{Client, header};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use crate::extractor::{DEFAULT_EXCLUDE, ExtractionRules};
use crate::llm::{
    OpportunityExtractor, SelectorGenerator,
    errors::LlmError,
    types::{ChatResponseRaw, ProposedSelectors, StructuredRequest, VolunteerOpportunity},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_HTML_PREVIEW_CHARS: usize = 8000;

const OPPORTUNITY_PROMPT: &str = "You extract structured, concise volunteer opportunity data. \
Answer with the best value for every field.";

const SELECTOR_PROMPT: &str = "You analyze raw HTML of a single volunteer opportunity page and \
propose minimal CSS include selectors capturing only the core descriptive content and exclude \
selectors removing surrounding boilerplate. Keep selectors short.";

/// OpenAI-compatible chat completions client using JSON-schema responses.
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    html_preview_chars: usize,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            html_preview_chars: DEFAULT_HTML_PREVIEW_CHARS,
        }
    }

    /// Azure, proxies, local servers.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// How much raw HTML is sent for selector generation.
    pub fn with_html_preview_chars(mut self, chars: usize) -> Self {
        self.html_preview_chars = chars;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a schema-constrained request and return the raw JSON completion.
    pub async fn structured_output(&self, request: StructuredRequest) -> Result<String, LlmError> {
        if self.api_key.is_empty() {
            return Err(LlmError::Config("api key is empty".into()));
        }

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("status {status}: {error_text}")));
        }

        let chat_response: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| LlmError::Api("completion had no content".into()))
    }

    async fn extract_json<T: DeserializeOwned>(
        &self,
        schema_name: &str,
        system: &str,
        user: String,
        schema: serde_json::Value,
    ) -> Result<T, LlmError> {
        let request = StructuredRequest::new(&self.model, schema_name, system, user, schema);
        let json = self.structured_output(request).await?;
        serde_json::from_str(&json)
            .map_err(|e| LlmError::Parse(format!("failed to deserialize {schema_name}: {e}")))
    }
}

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

#[async_trait]
impl SelectorGenerator for OpenAiClient {
    #[instrument(skip_all, fields(url = %url, model = %self.model))]
    async fn propose(&self, raw_html: &str, url: &Url) -> Result<ExtractionRules, LlmError> {
        let preview = truncate_chars(raw_html, self.html_preview_chars);
        let user = format!("URL: {url}\nRaw HTML:\n{preview}\nReturn the selectors.");

        let proposed: ProposedSelectors = self
            .extract_json("parser_selectors", SELECTOR_PROMPT, user, ProposedSelectors::schema())
            .await?;

        let include = proposed
            .include
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("body");
        let exclude = proposed
            .exclude
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_EXCLUDE);

        debug!(include, exclude, "selectors proposed");
        Ok(ExtractionRules::new(include, exclude))
    }
}

#[async_trait]
impl OpportunityExtractor for OpenAiClient {
    #[instrument(skip_all, fields(url = %url, model = %self.model))]
    async fn extract(&self, text: &str, url: &Url) -> Result<VolunteerOpportunity, LlmError> {
        let user = format!("URL: {url}\nPage Text:\n{text}");
        let mut opportunity: VolunteerOpportunity = self
            .extract_json(
                "volunteer_opportunity",
                OPPORTUNITY_PROMPT,
                user,
                VolunteerOpportunity::schema(),
            )
            .await?;
        opportunity.url = url.to_string();
        Ok(opportunity)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{Router, body::to_bytes, response::Response};
use std::{sync::Arc, time::Duration};
use url::Url;

use volunteer_scraper::{
    app_state::AppState,
    fetcher::{FetchError, FetchMode, PageFetcher, StaticFetcher},
    llm::{NoModel, OpenAiClient},
    router::build_router,
    service::ExtractionService,
    sites::{InMemorySiteConfigStore, SiteConfigStore},
    strategy::FetchStrategy,
};

/// Stands in for headless Chrome, which is not available in CI.
pub struct NoBrowser;

#[async_trait]
impl PageFetcher for NoBrowser {
    fn mode(&self) -> FetchMode {
        FetchMode::Rendered
    }

    async fn fetch(&self, _url: &Url, _wait_selector: Option<&str>) -> Result<String, FetchError> {
        Err(FetchError::BrowserLaunch("no browser in tests".to_string()))
    }
}

pub fn test_strategy() -> FetchStrategy {
    let static_fetcher =
        StaticFetcher::new(Duration::from_secs(5)).expect("Failed to build static fetcher");
    FetchStrategy::new(Arc::new(static_fetcher), Arc::new(NoBrowser))
}

/// Router wired like the api binary, with the LLM pointed at `llm_base_url` when given.
pub fn test_app(store: Arc<dyn SiteConfigStore>, llm_base_url: Option<&str>) -> Router {
    let service = match llm_base_url {
        Some(base_url) => {
            let client = Arc::new(OpenAiClient::new("test-key").with_base_url(base_url));
            ExtractionService::new(store, test_strategy(), client.clone())
                .with_opportunity_extractor(client)
        }
        None => ExtractionService::new(store, test_strategy(), Arc::new(NoModel)),
    };

    build_router(AppState::new(service), &[])
}

pub fn empty_store() -> Arc<InMemorySiteConfigStore> {
    Arc::new(InMemorySiteConfigStore::new())
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// A chat completions body whose single message is `content` serialized as JSON.
pub fn completion(content: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content.to_string() },
            "finish_reason": "stop"
        }]
    })
}

pub fn opportunity_json() -> serde_json::Value {
    serde_json::json!({
        "organization_name": "Harbor Food Bank",
        "activity_type": "food sorting",
        "location": "12 Pier Rd, Portland, ME",
        "time_slot": "Sa",
        "slot_availability": ["individual drop-in welcome", "group"],
        "contact_email": "help@harbor.org",
        "contact_number": 2075550100i64,
        "extra": "Closed-toe shoes required.",
        "tags": ["hunger", "community"]
    })
}

pub mod browser;
pub mod client;
pub mod errors;
pub mod pipeline;
pub mod types;

use async_trait::async_trait;
use url::Url;

pub use browser::{RenderSettings, RenderingFetcher};
pub use client::{BROWSER_USER_AGENT, StaticFetcher};
pub use errors::FetchError;
pub use types::{Charset, FetchMode, FetchResult, PageResponse};

/// Something that turns a URL into raw HTML.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn mode(&self) -> FetchMode;

    /// `wait_selector` is only meaningful to fetchers that execute scripts.
    async fn fetch(&self, url: &Url, wait_selector: Option<&str>) -> Result<String, FetchError>;
}

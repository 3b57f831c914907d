//! Headless Chromium fetcher.
//!
//! Every call launches its own browser with its own profile directory and
//! tears it down afterwards. Nothing is shared between calls, so a crashed or
//! wedged page only ever affects the request that opened it.

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::fetcher::{PageFetcher, client::BROWSER_USER_AGENT, errors::FetchError, types::FetchMode};

/// Elements that usually mark the rendered main content.
const CONTENT_MARKERS: [&str; 5] = ["main", "article", "[role='main']", "#content", ".content"];
const POLL_INTERVAL: Duration = Duration::from_millis(250);

static PROFILE_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    /// Upper bound for the initial navigation.
    pub navigation_timeout: Duration,
    /// How long to wait for a configured wait selector.
    pub wait_selector_timeout: Duration,
    /// How long to wait for any of the generic content markers.
    pub content_wait_timeout: Duration,
    /// Fixed pause when no content marker shows up.
    pub settle_delay: Duration,
    /// Explicit Chrome/Chromium binary; auto-detected when unset.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            navigation_timeout: Duration::from_secs(30),
            wait_selector_timeout: Duration::from_secs(10),
            content_wait_timeout: Duration::from_secs(5),
            settle_delay: Duration::from_secs(2),
            chrome_executable: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderingFetcher {
    settings: RenderSettings,
}

impl RenderingFetcher {
    pub fn new(settings: RenderSettings) -> Self {
        Self { settings }
    }

    #[instrument(skip_all, fields(url = %url))]
    pub async fn render(&self, url: &Url, wait_selector: Option<&str>) -> Result<String, FetchError> {
        let session = BrowserSession::launch(&self.settings).await?;
        let result = self.capture(&session.browser, url, wait_selector).await;
        session.close().await;

        if let Ok(html) = &result {
            info!(bytes = html.len(), "rendered fetch complete");
        }
        result
    }

    async fn capture(
        &self,
        browser: &Browser,
        url: &Url,
        wait_selector: Option<&str>,
    ) -> Result<String, FetchError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(FetchError::from_browser_error)?;

        match tokio::time::timeout(self.settings.navigation_timeout, page.goto(url.as_str())).await
        {
            Ok(Ok(_)) => debug!("navigation finished"),
            Ok(Err(e)) => return Err(FetchError::from_browser_error(e)),
            Err(_) => warn!(
                timeout = ?self.settings.navigation_timeout,
                "navigation did not settle, reading what has loaded"
            ),
        }

        match wait_selector {
            Some(selector) => {
                if !wait_for_any(&page, &[selector], self.settings.wait_selector_timeout).await {
                    warn!(selector, "wait selector never appeared");
                }
            }
            None => {
                if !wait_for_any(&page, &CONTENT_MARKERS, self.settings.content_wait_timeout).await
                {
                    debug!(delay = ?self.settings.settle_delay, "no content marker, settling");
                    tokio::time::sleep(self.settings.settle_delay).await;
                }
            }
        }

        let html = page.content().await.map_err(FetchError::from_browser_error)?;
        if html.trim().is_empty() {
            return Err(FetchError::EmptyRender);
        }
        Ok(html)
    }
}

#[async_trait]
impl PageFetcher for RenderingFetcher {
    fn mode(&self) -> FetchMode {
        FetchMode::Rendered
    }

    async fn fetch(&self, url: &Url, wait_selector: Option<&str>) -> Result<String, FetchError> {
        self.render(url, wait_selector).await
    }
}

/// Poll until one of `selectors` is present or `limit` elapses.
async fn wait_for_any(page: &Page, selectors: &[&str], limit: Duration) -> bool {
    let deadline = Instant::now() + limit;
    loop {
        for selector in selectors {
            if page.find_element(*selector).await.is_ok() {
                debug!(selector, "content marker present");
                return true;
            }
        }
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

/// A launched browser plus the task driving its CDP connection.
///
/// `close` is the normal exit. If the future holding the session is dropped
/// instead, `Browser`'s own drop kills the child process and the drop below
/// stops the handler task.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    profile_dir: PathBuf,
}

impl BrowserSession {
    async fn launch(settings: &RenderSettings) -> Result<Self, FetchError> {
        let profile_dir = std::env::temp_dir().join(format!(
            "volunteer-scraper-{}-{}",
            std::process::id(),
            PROFILE_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&profile_dir)
            .request_timeout(settings.navigation_timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--no-first-run")
            .arg(format!("--user-agent={BROWSER_USER_AGENT}"));
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(FetchError::BrowserLaunch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| FetchError::BrowserLaunch(e.to_string()))?;
        let handler = tokio::spawn(async move { while handler.next().await.is_some() {} });
        debug!(profile = %profile_dir.display(), "browser launched");

        Ok(Self {
            browser,
            handler,
            profile_dir,
        })
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            debug!(error = %e, "browser close command failed");
        }
        if let Err(e) = self.browser.wait().await {
            debug!(error = %e, "waiting for browser exit failed");
        }
        if let Err(e) = tokio::fs::remove_dir_all(&self.profile_dir).await {
            debug!(error = %e, "profile directory cleanup failed");
        }
        debug!("browser closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn settings(content_wait: Duration, settle: Duration) -> RenderSettings {
        RenderSettings {
            navigation_timeout: Duration::from_secs(15),
            wait_selector_timeout: Duration::from_secs(5),
            content_wait_timeout: content_wait,
            settle_delay: settle,
            chrome_executable: std::env::var_os("CHROME_EXECUTABLE").map(PathBuf::from),
        }
    }

    async fn serve(server: &MockServer, route: &str, html: &str) -> Url {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(html.as_bytes().to_vec())
                    .insert_header("Content-Type", "text/html; charset=utf-8"),
            )
            .mount(server)
            .await;
        Url::parse(&format!("{}{route}", server.uri())).unwrap()
    }

    #[tokio::test]
    #[ignore = "needs a local Chrome"]
    async fn test_wait_selector_takes_priority_over_content_markers() {
        let server = MockServer::start().await;
        // <main> is there from the start; only the wait selector is late.
        let url = serve(
            &server,
            "/late-listing",
            r#"<html><body><main>Loading roles</main><script>
                setTimeout(function () {
                    var el = document.createElement('div');
                    el.className = 'listing';
                    el.textContent = 'Late listing: weekend tree planting';
                    document.body.appendChild(el);
                }, 1000);
            </script></body></html>"#,
        )
        .await;
        let fetcher = RenderingFetcher::new(settings(Duration::from_secs(5), Duration::ZERO));

        let html = fetcher.render(&url, Some(".listing")).await.unwrap();

        assert!(html.contains("Late listing: weekend tree planting"));
    }

    #[tokio::test]
    #[ignore = "needs a local Chrome"]
    async fn test_settle_delay_applies_without_content_markers() {
        let server = MockServer::start().await;
        let url = serve(
            &server,
            "/no-markers",
            r#"<html><body><div id="app"></div><script>
                setTimeout(function () {
                    document.getElementById('app').textContent = 'Settled: river cleanup crew';
                }, 300);
            </script></body></html>"#,
        )
        .await;
        let fetcher = RenderingFetcher::new(settings(
            Duration::from_millis(100),
            Duration::from_millis(1500),
        ));

        let started = Instant::now();
        let html = fetcher.render(&url, None).await.unwrap();

        assert!(html.contains("Settled: river cleanup crew"));
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test]
    #[ignore = "needs a local Chrome"]
    async fn test_content_marker_skips_settle_delay() {
        let server = MockServer::start().await;
        let url = serve(
            &server,
            "/marked",
            "<html><body><article>Mentor a first-year student</article></body></html>",
        )
        .await;
        let fetcher = RenderingFetcher::new(settings(
            Duration::from_secs(2),
            Duration::from_secs(30),
        ));

        let html = tokio::time::timeout(Duration::from_secs(20), fetcher.render(&url, None))
            .await
            .expect("settle delay should not apply when a marker is present")
            .unwrap();

        assert!(html.contains("Mentor a first-year student"));
    }
}

use serde::Serialize;
use tracing::{info, instrument, warn};
use url::Url;

use crate::errors::ScrapeError;
use crate::extractor::{Diagnostic, reduce_with_diagnostics, run_blocking};
use crate::fetcher::FetchMode;
use crate::sites::FetchInstructions;
use crate::strategy::{FetchAttempt, FetchStrategy};

/// Cleaned text of one page and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CleanedPage {
    pub url: Url,
    pub text: String,
    pub mode: FetchMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl FetchStrategy {
    /// Fetch with the preferred mode, fall back to the other one when the
    /// cleaned text is short or the fetch failed, then report exhaustion.
    #[instrument(skip_all, fields(url = %url, preferred = %instructions.mode))]
    pub async fn fetch_cleaned(
        &self,
        url: &Url,
        instructions: &FetchInstructions,
    ) -> Result<CleanedPage, ScrapeError> {
        instructions.rules.validate()?;

        let mut attempts = Vec::new();
        for mode in [instructions.mode, instructions.mode.other()] {
            let wait_selector = match mode {
                FetchMode::Rendered => instructions.wait_selector.as_deref(),
                FetchMode::Static => None,
            };

            let html = match self.fetcher(mode).fetch(url, wait_selector).await {
                Ok(html) => html,
                Err(e) => {
                    warn!(mode = %mode, error = %e, "fetch failed");
                    attempts.push(FetchAttempt::failed(mode, e));
                    continue;
                }
            };

            let rules = instructions.rules.clone();
            let reduction = run_blocking(move || {
                reduce_with_diagnostics(&html, rules.include(), rules.exclude())
            })
            .await??;
            let chars = reduction.text.chars().count();
            if self.is_sufficient(chars) {
                info!(mode = %mode, chars, "content extracted");
                return Ok(CleanedPage {
                    url: url.clone(),
                    text: reduction.text,
                    mode,
                    diagnostics: reduction.diagnostics,
                });
            }

            warn!(
                mode = %mode,
                chars,
                threshold = self.min_content_chars(),
                "content below threshold"
            );
            attempts.push(FetchAttempt::insufficient(mode, chars));
        }

        Err(ScrapeError::FetchFailed { attempts })
    }
}

use serde::Serialize;
use tracing::{info, instrument, warn};
use url::Url;

use crate::errors::ScrapeError;
use crate::extractor::{
    Diagnostic, ExtractError, ExtractionRules, guess_rules, reduce, reduce_with_diagnostics,
    run_blocking, visible_text,
};
use crate::fetcher::{FetchMode, FetchResult};
use crate::llm::{LlmError, SelectorGenerator};
use crate::sites::MAX_SELECTOR_LENGTH;
use crate::strategy::{FetchAttempt, FetchStrategy};
use crate::urls::Domain;

/// Where the proposed rules came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesSource {
    Generated,
    Heuristic,
}

/// Proposed rules for a domain plus previews for the operator to review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discovery {
    pub url: Url,
    pub domain: Domain,
    pub rules: ExtractionRules,
    pub rules_source: RulesSource,
    /// Text after applying `rules`.
    pub cleaned_preview: String,
    /// Text with no include/exclude rules at all.
    pub raw_preview: String,
    /// Mode that actually produced the page.
    pub recommended_mode: FetchMode,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug)]
enum DiscoveryState {
    TryStatic,
    CheckSufficiency { html: String },
    TryRendered { static_html: String, static_chars: usize },
    Done(FetchResult),
    Failed,
}

impl FetchStrategy {
    /// Fetch a page of an unconfigured domain and propose rules for it.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn discover(
        &self,
        url: &Url,
        generator: &dyn SelectorGenerator,
    ) -> Result<Discovery, ScrapeError> {
        let mut attempts = Vec::new();
        let mut state = DiscoveryState::TryStatic;

        let fetched = loop {
            state = match state {
                DiscoveryState::TryStatic => {
                    match self.fetcher(FetchMode::Static).fetch(url, None).await {
                        Ok(html) => DiscoveryState::CheckSufficiency { html },
                        Err(e) => {
                            warn!(error = %e, "static fetch failed, treating page as empty");
                            attempts.push(FetchAttempt::failed(FetchMode::Static, e));
                            DiscoveryState::CheckSufficiency {
                                html: String::new(),
                            }
                        }
                    }
                }
                DiscoveryState::CheckSufficiency { html } => {
                    let (html, chars) = visible_chars(html).await?;
                    info!(chars, "static visible text");
                    if self.is_sufficient(chars) {
                        DiscoveryState::Done(FetchResult {
                            html,
                            mode: FetchMode::Static,
                        })
                    } else {
                        if !html.is_empty() {
                            attempts.push(FetchAttempt::insufficient(FetchMode::Static, chars));
                        }
                        DiscoveryState::TryRendered {
                            static_html: html,
                            static_chars: chars,
                        }
                    }
                }
                DiscoveryState::TryRendered {
                    static_html,
                    static_chars,
                } => {
                    // Rendering gave nothing usable; a short static page still beats none.
                    let static_fallback = || {
                        if static_chars > 0 {
                            warn!(chars = static_chars, "keeping short static page");
                            DiscoveryState::Done(FetchResult {
                                html: static_html,
                                mode: FetchMode::Static,
                            })
                        } else {
                            DiscoveryState::Failed
                        }
                    };

                    match self.fetcher(FetchMode::Rendered).fetch(url, None).await {
                        Ok(html) => {
                            let (html, chars) = visible_chars(html).await?;
                            info!(chars, "rendered visible text");
                            if chars > 0 {
                                if !self.is_sufficient(chars) {
                                    warn!(
                                        chars,
                                        threshold = self.min_content_chars(),
                                        "rendered page is still short"
                                    );
                                }
                                DiscoveryState::Done(FetchResult {
                                    html,
                                    mode: FetchMode::Rendered,
                                })
                            } else {
                                attempts.push(FetchAttempt::insufficient(FetchMode::Rendered, 0));
                                static_fallback()
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "rendered fetch failed");
                            attempts.push(FetchAttempt::failed(FetchMode::Rendered, e));
                            static_fallback()
                        }
                    }
                }
                DiscoveryState::Done(result) => break Some(result),
                DiscoveryState::Failed => break None,
            };
        };

        let Some(fetched) = fetched else {
            return Err(ScrapeError::FetchFailed { attempts });
        };

        let (rules, rules_source) = propose_rules(&fetched.html, url, generator).await?;
        let html = fetched.html;
        let proposed = rules.clone();
        let (raw_preview, cleaned) = run_blocking(move || -> Result<_, ExtractError> {
            let raw = reduce(&html, None, None)?;
            let cleaned = reduce_with_diagnostics(&html, proposed.include(), proposed.exclude())?;
            Ok((raw, cleaned))
        })
        .await??;

        info!(
            mode = %fetched.mode,
            include = %rules.include,
            cleaned_chars = cleaned.text.chars().count(),
            "discovery complete"
        );

        Ok(Discovery {
            url: url.clone(),
            domain: Domain::from_url(url),
            rules,
            rules_source,
            cleaned_preview: cleaned.text,
            raw_preview,
            recommended_mode: fetched.mode,
            diagnostics: cleaned.diagnostics,
        })
    }
}

/// Ask the generator for rules, falling back to the heuristic when it fails
/// or proposes something unusable.
pub async fn propose_rules(
    raw_html: &str,
    url: &Url,
    generator: &dyn SelectorGenerator,
) -> Result<(ExtractionRules, RulesSource), ScrapeError> {
    match generator.propose(raw_html, url).await {
        Ok(rules) => match usable(&rules) {
            Ok(()) => return Ok((rules, RulesSource::Generated)),
            Err(reason) => warn!(
                include = %rules.include,
                exclude = %rules.exclude,
                reason = %reason,
                "proposed selectors unusable, using heuristic"
            ),
        },
        Err(LlmError::NotConfigured) => {}
        Err(e) => warn!(error = %e, "selector generation failed, using heuristic"),
    }

    let html = raw_html.to_string();
    let rules = run_blocking(move || guess_rules(&html)).await?;
    Ok((rules, RulesSource::Heuristic))
}

/// Visible character count, handing the page back for the next state.
async fn visible_chars(html: String) -> Result<(String, usize), ScrapeError> {
    let counted = run_blocking(move || {
        let chars = visible_text(&html).chars().count();
        (html, chars)
    })
    .await?;
    Ok(counted)
}

fn usable(rules: &ExtractionRules) -> Result<(), String> {
    if rules.include().is_none() {
        return Err("empty include selector".to_string());
    }
    if rules.include.len() > MAX_SELECTOR_LENGTH || rules.exclude.len() > MAX_SELECTOR_LENGTH {
        return Err("selector too long".to_string());
    }
    rules.validate().map_err(|e| e.to_string())
}

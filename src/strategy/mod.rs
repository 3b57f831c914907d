//! Decides which fetcher runs, in which order, and when a page has enough
//! text to stop.
//!
//! Two procedures live here: [`FetchStrategy::fetch_cleaned`] for routine
//! extraction with known rules, and [`FetchStrategy::discover`] for working
//! out rules for a domain nobody has configured yet. Within one call the
//! fetchers always run one after the other.

pub mod discovery;
pub mod extract;

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::fetcher::{FetchMode, PageFetcher};

pub use discovery::{Discovery, RulesSource, propose_rules};
pub use extract::CleanedPage;

/// Fewer characters than this and a page counts as empty shell.
pub const DEFAULT_MIN_CONTENT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Failed { error: String },
    Insufficient { chars: usize },
}

/// One fetcher run that did not produce usable content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchAttempt {
    pub mode: FetchMode,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl FetchAttempt {
    pub fn failed(mode: FetchMode, error: impl ToString) -> Self {
        Self {
            mode,
            outcome: AttemptOutcome::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn insufficient(mode: FetchMode, chars: usize) -> Self {
        Self {
            mode,
            outcome: AttemptOutcome::Insufficient { chars },
        }
    }
}

impl fmt::Display for FetchAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.outcome {
            AttemptOutcome::Failed { error } => write!(f, "{}: {}", self.mode, error),
            AttemptOutcome::Insufficient { chars } => write!(f, "{}: {} chars", self.mode, chars),
        }
    }
}

#[derive(Clone)]
pub struct FetchStrategy {
    static_fetcher: Arc<dyn PageFetcher>,
    rendering_fetcher: Arc<dyn PageFetcher>,
    min_content_chars: usize,
}

impl FetchStrategy {
    pub fn new(
        static_fetcher: Arc<dyn PageFetcher>,
        rendering_fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            static_fetcher,
            rendering_fetcher,
            min_content_chars: DEFAULT_MIN_CONTENT_CHARS,
        }
    }

    pub fn with_min_content_chars(mut self, chars: usize) -> Self {
        self.min_content_chars = chars;
        self
    }

    pub fn min_content_chars(&self) -> usize {
        self.min_content_chars
    }

    /// Threshold check in characters, not bytes.
    pub fn is_sufficient(&self, chars: usize) -> bool {
        chars >= self.min_content_chars
    }

    fn fetcher(&self, mode: FetchMode) -> &dyn PageFetcher {
        match mode {
            FetchMode::Static => self.static_fetcher.as_ref(),
            FetchMode::Rendered => self.rendering_fetcher.as_ref(),
        }
    }
}

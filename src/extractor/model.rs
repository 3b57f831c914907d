use scraper::Selector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tags that are removed as page chrome when no better rule is known.
pub const DEFAULT_EXCLUDE: &str = "script, style, nav, footer, header, aside";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// Include/exclude CSS selector lists. Empty strings mean "no rule".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    #[serde(default)]
    pub include: String,
    #[serde(default)]
    pub exclude: String,
}

impl ExtractionRules {
    pub fn new(include: impl Into<String>, exclude: impl Into<String>) -> Self {
        Self {
            include: include.into(),
            exclude: exclude.into(),
        }
    }

    /// Rules used for a domain nobody has configured yet.
    pub fn fallback() -> Self {
        Self::new("body", DEFAULT_EXCLUDE)
    }

    pub fn include(&self) -> Option<&str> {
        non_blank(&self.include)
    }

    pub fn exclude(&self) -> Option<&str> {
        non_blank(&self.exclude)
    }

    /// Both selector lists parse as CSS.
    pub fn validate(&self) -> Result<(), ExtractError> {
        parse_selector(self.include())?;
        parse_selector(self.exclude())?;
        Ok(())
    }
}

/// Non-fatal findings recorded while reducing a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The include selector matched nothing and body text was used instead.
    SelectorMatchEmpty { selector: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reduction {
    pub text: String,
    pub diagnostics: Vec<Diagnostic>,
}

pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub(crate) fn parse_selector(raw: Option<&str>) -> Result<Option<Selector>, ExtractError> {
    raw.map(|selector| {
        Selector::parse(selector).map_err(|e| ExtractError::InvalidSelector {
            selector: selector.to_string(),
            reason: e.to_string(),
        })
    })
    .transpose()
}

/// Trim every line and drop the empty ones.
pub fn join_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

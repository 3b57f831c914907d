use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::extractor::ExtractionRules;
use crate::fetcher::FetchMode;
use crate::urls::Domain;

pub const MAX_SELECTOR_LENGTH: usize = 1000;

static SAFE_DOMAIN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.-]+$").expect("Failed to compile domain regex"));

/// Extraction rule recorded for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub domain: Domain,
    #[serde(default)]
    pub fetch_mode: FetchMode,
    #[serde(default)]
    pub include_selector: String,
    #[serde(default)]
    pub exclude_selector: String,
    /// Selector a rendered fetch waits for before reading the page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_selector: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SiteConfig {
    pub fn new(domain: Domain, fetch_mode: FetchMode, rules: ExtractionRules) -> Self {
        Self {
            domain,
            fetch_mode,
            include_selector: rules.include,
            exclude_selector: rules.exclude,
            wait_selector: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_wait_selector(mut self, selector: impl Into<String>) -> Self {
        self.wait_selector = Some(selector.into());
        self
    }

    pub fn rules(&self) -> ExtractionRules {
        ExtractionRules::new(&self.include_selector, &self.exclude_selector)
    }

    pub fn instructions(&self) -> FetchInstructions {
        FetchInstructions {
            mode: self.fetch_mode,
            rules: self.rules(),
            wait_selector: self.wait_selector.clone(),
        }
    }
}

/// Everything the fetch strategy needs to know about a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchInstructions {
    /// Fetcher tried first; the other one is the fallback.
    pub mode: FetchMode,
    pub rules: ExtractionRules,
    pub wait_selector: Option<String>,
}

impl FetchInstructions {
    /// Static first, whole body minus page chrome.
    pub fn fallback() -> Self {
        Self {
            mode: FetchMode::Static,
            rules: ExtractionRules::fallback(),
            wait_selector: None,
        }
    }
}

/// Operator-supplied config before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfigInput {
    pub domain: String,
    #[serde(default)]
    pub include: String,
    #[serde(default)]
    pub exclude: String,
    /// `get` or `js`; `static`/`rendered` are accepted too.
    #[serde(default)]
    pub crawler: Option<String>,
    #[serde(default)]
    pub wait: Option<String>,
}

impl SiteConfigInput {
    pub fn validate(&self) -> Result<SiteConfig, String> {
        let raw_domain = self.domain.trim();
        if !SAFE_DOMAIN_REGEX.is_match(raw_domain) {
            return Err("Invalid domain".to_string());
        }
        let domain = Domain::parse(raw_domain).map_err(|e| format!("Invalid domain: {e}"))?;

        let include = self.include.trim();
        let exclude = self.exclude.trim();
        if include.len() > MAX_SELECTOR_LENGTH || exclude.len() > MAX_SELECTOR_LENGTH {
            return Err("Selector too long".to_string());
        }

        let fetch_mode = match self.crawler.as_deref().map(str::trim) {
            None | Some("") => FetchMode::Static,
            Some(name) => FetchMode::from_crawler_name(name)
                .ok_or_else(|| "crawler must be get or js".to_string())?,
        };

        let rules = ExtractionRules::new(include, exclude);
        rules.validate().map_err(|e| e.to_string())?;

        let mut config = SiteConfig::new(domain, fetch_mode, rules);
        if let Some(wait) = self.wait.as_deref().map(str::trim).filter(|w| !w.is_empty()) {
            ExtractionRules::new(wait, "")
                .validate()
                .map_err(|e| e.to_string())?;
            config = config.with_wait_selector(wait);
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(domain: &str, include: &str, crawler: Option<&str>) -> SiteConfigInput {
        SiteConfigInput {
            domain: domain.to_string(),
            include: include.to_string(),
            exclude: "nav, footer".to_string(),
            crawler: crawler.map(str::to_string),
            wait: None,
        }
    }

    #[test]
    fn test_valid_input_is_normalized() {
        let config = input("WWW.Example.org", "  #main  ", Some("js"))
            .validate()
            .unwrap();
        assert_eq!(config.domain.as_str(), "example.org");
        assert_eq!(config.include_selector, "#main");
        assert_eq!(config.fetch_mode, FetchMode::Rendered);
    }

    #[test]
    fn test_crawler_defaults_to_static() {
        let config = input("example.org", "main", None).validate().unwrap();
        assert_eq!(config.fetch_mode, FetchMode::Static);
    }

    #[test]
    fn test_rejects_unknown_crawler() {
        assert!(input("example.org", "main", Some("curl")).validate().is_err());
    }

    #[test]
    fn test_rejects_unsafe_domain() {
        assert!(input("example.org/path", "main", None).validate().is_err());
        assert!(input("exa mple.org", "main", None).validate().is_err());
    }

    #[test]
    fn test_rejects_overlong_selector() {
        let long = "div ".repeat(300);
        assert_eq!(
            input("example.org", &long, None).validate().unwrap_err(),
            "Selector too long"
        );
    }

    #[test]
    fn test_rejects_unparseable_selector() {
        assert!(input("example.org", "main >", None).validate().is_err());
    }

    #[test]
    fn test_wait_selector_is_kept() {
        let mut raw = input("example.org", "main", Some("js"));
        raw.wait = Some(".listing".to_string());
        let config = raw.validate().unwrap();
        assert_eq!(config.instructions().wait_selector.as_deref(), Some(".listing"));
    }
}

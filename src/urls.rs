//! URL normalization and the domain key used for site configuration lookup.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;
use url::Url;

pub const MAX_URL_LENGTH: usize = 2048;

static SAFE_HOST_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9.-]+$").expect("Failed to compile host regex"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("url is empty")]
    Empty,

    #[error("url too long ({0} chars)")]
    TooLong(usize),

    #[error("unparseable url: {0}")]
    Parse(#[from] url::ParseError),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid host: {0}")]
    InvalidHost(String),
}

/// Turn user input into an absolute http(s) URL.
///
/// A missing scheme defaults to `https`, so `example.com/jobs` becomes
/// `https://example.com/jobs`. Hosts are lowercased by the parser and must
/// only contain ASCII letters, digits, dots and dashes.
pub fn normalize_url(input: &str) -> Result<Url, UrlError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(UrlError::Empty);
    }
    if input.len() > MAX_URL_LENGTH {
        return Err(UrlError::TooLong(input.len()));
    }

    let candidate = if input.contains("://") {
        input.to_string()
    } else if let Some(rest) = input.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        format!("https://{input}")
    };

    let url = Url::parse(&candidate)?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() && SAFE_HOST_REGEX.is_match(host) => Ok(url),
        Some(host) => Err(UrlError::InvalidHost(host.to_string())),
        None => Err(UrlError::InvalidHost(String::new())),
    }
}

/// Normalized host of a URL: lowercased, leading `www.` removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Domain(String);

impl Domain {
    /// Derive the key from an already normalized URL.
    pub fn from_url(url: &Url) -> Self {
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        Self(host.to_string())
    }

    /// Accepts either a bare host (`WWW.Example.com`) or a full URL.
    pub fn parse(input: &str) -> Result<Self, UrlError> {
        let url = normalize_url(input)?;
        let domain = Self::from_url(&url);
        if domain.0.is_empty() {
            return Err(UrlError::InvalidHost(input.to_string()));
        }
        Ok(domain)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Domain {
    type Error = UrlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Domain> for String {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

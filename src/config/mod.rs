//! Configuration handling for the service and the CLI.
//!
//! Everything comes from environment variables with development defaults.
//! `Config::from_env` parses and validates them; numbers that do not parse
//! are reported as `ConfigError::InvalidValue` instead of silently defaulting.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::fetcher::RenderSettings;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_HTML_PREVIEW_CHARS, DEFAULT_MODEL};
use crate::strategy::DEFAULT_MIN_CONTENT_CHARS;

pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_SITE_CONFIG_PATH: &str = "SITE_CONFIG_PATH";
pub const ENV_MIN_CONTENT_CHARS: &str = "MIN_CONTENT_CHARS";
pub const ENV_STATIC_FETCH_TIMEOUT_SECS: &str = "STATIC_FETCH_TIMEOUT_SECS";
pub const ENV_RENDER_NAV_TIMEOUT_SECS: &str = "RENDER_NAV_TIMEOUT_SECS";
pub const ENV_RENDER_WAIT_SELECTOR_SECS: &str = "RENDER_WAIT_SELECTOR_SECS";
pub const ENV_RENDER_CONTENT_WAIT_SECS: &str = "RENDER_CONTENT_WAIT_SECS";
pub const ENV_RENDER_SETTLE_MILLIS: &str = "RENDER_SETTLE_MILLIS";
pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";
pub const ENV_REQUIRE_SITE_CONFIG: &str = "REQUIRE_SITE_CONFIG";
pub const ENV_LLM_API_KEY: &str = "LLM_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_LLM_BASE_URL: &str = "LLM_BASE_URL";
pub const ENV_LLM_MODEL: &str = "LLM_MODEL";
pub const ENV_LLM_HTML_PREVIEW_CHARS: &str = "LLM_HTML_PREVIEW_CHARS";
pub const ENV_CORS_ORIGINS: &str = "CORS_ORIGINS";
pub const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_SITE_CONFIG_PATH: &str = "sites.json";
const DEFAULT_STATIC_FETCH_TIMEOUT_SECS: u64 = 10;
const DEFAULT_RENDER_NAV_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RENDER_WAIT_SELECTOR_SECS: u64 = 10;
const DEFAULT_RENDER_CONTENT_WAIT_SECS: u64 = 5;
const DEFAULT_RENDER_SETTLE_MILLIS: u64 = 2000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://127.0.0.1:3000";

/// Log output shape for the binaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Language-model endpoint settings. Absent when no API key is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub html_preview_chars: usize,
}

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    database_url: Option<String>,
    site_config_path: PathBuf,
    min_content_chars: usize,
    static_fetch_timeout: Duration,
    render: RenderSettings,
    require_site_config: bool,
    llm: Option<LlmConfig>,
    cors_origins: Vec<String>,
    log_format: LogFormat,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let database_url = non_empty_var(ENV_DATABASE_URL);
        let site_config_path = non_empty_var(ENV_SITE_CONFIG_PATH)
            .unwrap_or_else(|| DEFAULT_SITE_CONFIG_PATH.to_string())
            .into();

        let min_content_chars = positive_var(ENV_MIN_CONTENT_CHARS, DEFAULT_MIN_CONTENT_CHARS)?;
        let static_fetch_timeout = Duration::from_secs(positive_var(
            ENV_STATIC_FETCH_TIMEOUT_SECS,
            DEFAULT_STATIC_FETCH_TIMEOUT_SECS,
        )?);

        let render = RenderSettings {
            navigation_timeout: Duration::from_secs(positive_var(
                ENV_RENDER_NAV_TIMEOUT_SECS,
                DEFAULT_RENDER_NAV_TIMEOUT_SECS,
            )?),
            wait_selector_timeout: Duration::from_secs(parse_var(
                ENV_RENDER_WAIT_SELECTOR_SECS,
                DEFAULT_RENDER_WAIT_SELECTOR_SECS,
            )?),
            content_wait_timeout: Duration::from_secs(parse_var(
                ENV_RENDER_CONTENT_WAIT_SECS,
                DEFAULT_RENDER_CONTENT_WAIT_SECS,
            )?),
            settle_delay: Duration::from_millis(parse_var(
                ENV_RENDER_SETTLE_MILLIS,
                DEFAULT_RENDER_SETTLE_MILLIS,
            )?),
            chrome_executable: non_empty_var(ENV_CHROME_EXECUTABLE).map(PathBuf::from),
        };

        let require_site_config = parse_bool(ENV_REQUIRE_SITE_CONFIG, false)?;

        let llm = match non_empty_var(ENV_LLM_API_KEY).or_else(|| non_empty_var(ENV_OPENAI_API_KEY)) {
            Some(api_key) => Some(LlmConfig {
                api_key,
                base_url: non_empty_var(ENV_LLM_BASE_URL)
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: non_empty_var(ENV_LLM_MODEL).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                html_preview_chars: positive_var(
                    ENV_LLM_HTML_PREVIEW_CHARS,
                    DEFAULT_HTML_PREVIEW_CHARS,
                )?,
            }),
            None => None,
        };

        let cors_origins = env::var(ENV_CORS_ORIGINS)
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        let log_format = match non_empty_var(ENV_LOG_FORMAT).as_deref() {
            None | Some("pretty") | Some("text") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: ENV_LOG_FORMAT,
                    reason: format!("expected 'json' or 'pretty', got '{other}'"),
                });
            }
        };

        Ok(Self {
            bind_addr,
            database_url,
            site_config_path,
            min_content_chars,
            static_fetch_timeout,
            render,
            require_site_config,
            llm,
            cors_origins,
            log_format,
        })
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }
    /// PostgreSQL URL; when set, site configs live in the database.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }
    /// JSON file used for site configs when no database is configured.
    pub fn site_config_path(&self) -> &Path {
        &self.site_config_path
    }
    pub fn min_content_chars(&self) -> usize {
        self.min_content_chars
    }
    pub fn static_fetch_timeout(&self) -> Duration {
        self.static_fetch_timeout
    }
    pub fn render_settings(&self) -> &RenderSettings {
        &self.render
    }
    pub fn require_site_config(&self) -> bool {
        self.require_site_config
    }
    pub fn llm(&self) -> Option<&LlmConfig> {
        self.llm.as_ref()
    }
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match non_empty_var(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            field: key,
            reason: format!("'{raw}': {e}"),
        }),
    }
}

fn positive_var<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
    T::Err: Display,
{
    let value = parse_var(key, default)?;
    if value == T::default() {
        return Err(ConfigError::InvalidValue {
            field: key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}

fn parse_bool(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match non_empty_var(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            field: key,
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}

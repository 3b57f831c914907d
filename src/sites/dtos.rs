use serde::Serialize;

use crate::sites::model::SiteConfig;

#[derive(Debug, Serialize)]
pub struct SaveConfigResponse {
    pub status: &'static str,
    pub domain: String,
    pub crawler: &'static str,
}

impl From<&SiteConfig> for SaveConfigResponse {
    fn from(config: &SiteConfig) -> Self {
        Self {
            status: "ok",
            domain: config.domain.to_string(),
            crawler: config.fetch_mode.crawler_name(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SiteConfigResponse {
    pub crawler: &'static str,
    #[serde(flatten)]
    pub config: SiteConfig,
}

impl From<SiteConfig> for SiteConfigResponse {
    fn from(config: SiteConfig) -> Self {
        Self {
            crawler: config.fetch_mode.crawler_name(),
            config,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SiteConfigListResponse {
    pub configs: Vec<SiteConfigResponse>,
}

#[derive(Debug, Serialize)]
pub struct DeleteConfigResponse {
    pub ok: bool,
}

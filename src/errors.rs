use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::extractor::ExtractError;
use crate::llm::LlmError;
use crate::sites::StoreError;
use crate::strategy::FetchAttempt;
use crate::urls::{Domain, UrlError};

/// Everything an extraction request can end in besides success.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("no site configuration for domain '{0}'")]
    NoConfigForDomain(Domain),

    #[error("no retrievable content ({})", describe_attempts(.attempts))]
    FetchFailed { attempts: Vec<FetchAttempt> },

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("unknown model '{requested}', this deployment uses '{available}'")]
    UnknownModel { requested: String, available: String },

    #[error("upstream extraction failed: {0}")]
    UpstreamExtractionFailed(#[source] LlmError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl ScrapeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_)
            | Self::UnknownModel { .. }
            | Self::Extract(ExtractError::InvalidSelector { .. }) => StatusCode::BAD_REQUEST,
            Self::NoConfigForDomain(_) => StatusCode::NOT_FOUND,
            Self::FetchFailed { .. } | Self::UpstreamExtractionFailed(_) => StatusCode::BAD_GATEWAY,
            Self::Extract(ExtractError::Worker(_)) | Self::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

impl IntoResponse for ScrapeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Store(e) => {
                error!(error = %e, "store failure");
                "Storage error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

fn describe_attempts(attempts: &[FetchAttempt]) -> String {
    if attempts.is_empty() {
        return "no fetch attempted".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

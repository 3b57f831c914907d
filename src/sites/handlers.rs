use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    app_state::AppState,
    errors::{ErrorResponse, ScrapeError},
    sites::{
        dtos::{DeleteConfigResponse, SaveConfigResponse, SiteConfigListResponse, SiteConfigResponse},
        model::SiteConfigInput,
    },
    urls::Domain,
};

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new("Config not found")),
    )
        .into_response()
}

fn parse_domain(raw: &str) -> Result<Domain, Response> {
    Domain::parse(raw).map_err(|e| ScrapeError::InvalidUrl(e).into_response())
}

pub async fn save_config(
    State(state): State<AppState>,
    Json(payload): Json<SiteConfigInput>,
) -> Response {
    let config = match payload.validate() {
        Ok(config) => config,
        Err(error) => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
        }
    };

    match state.service.save_config(config).await {
        Ok(saved) => Json(SaveConfigResponse::from(&saved)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn list_configs(State(state): State<AppState>) -> Response {
    match state.site_configs().list().await {
        Ok(configs) => Json(SiteConfigListResponse {
            configs: configs.into_iter().map(SiteConfigResponse::from).collect(),
        })
        .into_response(),
        Err(e) => ScrapeError::from(e).into_response(),
    }
}

pub async fn get_config(State(state): State<AppState>, Path(domain): Path<String>) -> Response {
    let domain = match parse_domain(&domain) {
        Ok(domain) => domain,
        Err(response) => return response,
    };

    match state.site_configs().get(&domain).await {
        Ok(Some(config)) => Json(SiteConfigResponse::from(config)).into_response(),
        Ok(None) => not_found(),
        Err(e) => ScrapeError::from(e).into_response(),
    }
}

pub async fn delete_config(State(state): State<AppState>, Path(domain): Path<String>) -> Response {
    let domain = match parse_domain(&domain) {
        Ok(domain) => domain,
        Err(response) => return response,
    };

    match state.site_configs().delete(&domain).await {
        Ok(true) => Json(DeleteConfigResponse { ok: true }).into_response(),
        Ok(false) => not_found(),
        Err(e) => ScrapeError::from(e).into_response(),
    }
}

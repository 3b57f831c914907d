use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{
    app_state::AppState,
    errors::ErrorResponse,
    scrape::dtos::{
        GenerateConfigRequest, GenerateConfigResponse, GenerateConfigUrlRequest,
        GenerateConfigUrlResponse, ScrapeRequest, ScrapeResponse,
    },
};

pub async fn scrape(State(state): State<AppState>, Json(payload): Json<ScrapeRequest>) -> Response {
    if let Err(e) = state.service.check_model(payload.model.as_deref()) {
        return e.into_response();
    }

    match state.service.scrape(&payload.url).await {
        Ok(outcome) => Json(ScrapeResponse::from(outcome)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn scrape_get(
    State(state): State<AppState>,
    Query(params): Query<ScrapeRequest>,
) -> Response {
    scrape(State(state), Json(params)).await
}

pub async fn generate_config(
    State(state): State<AppState>,
    Json(payload): Json<GenerateConfigRequest>,
) -> Response {
    if let Err(error) = payload.validate() {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response();
    }

    match state
        .service
        .generate_from_html(&payload.url, &payload.raw_html)
        .await
    {
        Ok(generated) => Json(GenerateConfigResponse::from(generated)).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn generate_config_url(
    State(state): State<AppState>,
    Json(payload): Json<GenerateConfigUrlRequest>,
) -> Response {
    match state.service.discover_selectors(&payload.url).await {
        Ok(discovery) => Json(GenerateConfigUrlResponse::from(discovery)).into_response(),
        Err(e) => e.into_response(),
    }
}

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{app_state::AppState, scrape::dtos::ScrapeRequest};

/// Scrape and store an opportunity. A URL that is already stored is returned
/// as-is with 200; a new record comes back with 201.
pub async fn scrape_and_save(
    State(state): State<AppState>,
    Json(payload): Json<ScrapeRequest>,
) -> Response {
    if let Err(e) = state.service.check_model(payload.model.as_deref()) {
        return e.into_response();
    }

    match state.service.scrape_and_save(&payload.url).await {
        Ok(saved) => {
            let status = if saved.created {
                StatusCode::CREATED
            } else {
                StatusCode::OK
            };
            (status, Json(saved.opportunity)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

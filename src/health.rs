use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use tracing::{error, info};

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    store: String,
}

pub async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, StatusCode> {
    match state.site_configs().ping().await {
        Ok(_) => {
            info!("Health check passed");
            Ok(Json(HealthResponse {
                status: "OK".to_string(),
                store: "healthy".to_string(),
            }))
        }
        Err(e) => {
            error!(error = %e, "Site config store health check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

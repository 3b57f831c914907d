use axum::{
    Router,
    http::{HeaderValue, Method, header::CONTENT_TYPE},
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{app_state::AppState, health::health_check, opportunities, scrape, sites};

pub fn build_router(state: AppState, cors_origins: &[String]) -> Router {
    let origins: Vec<HeaderValue> = cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        .route("/healthz", get(health_check))
        .route(
            "/api/scrape",
            post(scrape::handlers::scrape).get(scrape::handlers::scrape_get),
        )
        .route(
            "/api/scrape-and-save",
            post(opportunities::handlers::scrape_and_save),
        )
        .route("/api/generate-config", post(scrape::handlers::generate_config))
        .route(
            "/api/generate-config-url",
            post(scrape::handlers::generate_config_url),
        )
        .route("/api/save-config", post(sites::handlers::save_config))
        .route("/api/site-configs", get(sites::handlers::list_configs))
        .route(
            "/api/site-configs/{domain}",
            get(sites::handlers::get_config).delete(sites::handlers::delete_config),
        )
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::api::{handlers, state::AppState};

fn build_cors_layer() -> CorsLayer {
    let mut origins: Vec<HeaderValue> = std::env::var("FANVISE_API_CORS_ALLOWED_ORIGINS")
        .ok()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .filter_map(|v| HeaderValue::from_str(v).ok())
                .collect()
        })
        .unwrap_or_default();

    if origins.is_empty() {
        origins.push(HeaderValue::from_static("http://localhost:5173"));
        origins.push(HeaderValue::from_static("http://127.0.0.1:5173"));
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    Router::new()
        // Top-level, used by docker/scripts for readiness probes.
        .route("/health", get(handlers::health_handler))
        .route("/api/chat", post(handlers::chat_handler))
        .with_state(state)
        .layer(cors)
}

//! HTTP API route definitions.

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use super::handlers::{health, not_found, prometheus, save, weather, AppState};

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origin);
    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes);

    Router::new()
        // Health endpoints
        .route("/health", get(health))
        .route("/metrics", get(prometheus))
        // Tournament data
        .route("/save", post(save))
        .route("/weather", get(weather))
        .fallback(not_found)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        // Outermost, so preflights and errors carry the origin header too.
        .layer(cors)
        .with_state(state)
}

/// CORS for the single allowed origin. Answers every `OPTIONS` request.
pub fn cors_layer(origin: &str) -> CorsLayer {
    let origin = HeaderValue::from_str(origin).unwrap_or_else(|_| {
        warn!("Invalid allowed origin {:?}, denying cross-origin requests", origin);
        HeaderValue::from_static("null")
    });

    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

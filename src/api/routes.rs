use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::api::{handlers, state::AppState};
use crate::config::{CorsConfig, UploadConfig};

async fn handle_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": true,
            "message": "Not found. Use POST /runaiinference or POST /runrealewcltest.",
        })),
    )
}

/// CORS from config. `"*"` allows any origin, which is only fit for local use.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if config.allows_any() {
        warn!("CORS allows any origin; restrict cors.allowed_origins in production");
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.trim().parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(origins)
}

pub fn create_router(state: AppState, cors: &CorsConfig, upload: &UploadConfig) -> Router {
    Router::new()
        // System endpoints
        .route("/", get(handlers::liveness))
        .route("/health", get(handlers::liveness))
        // Inference endpoints
        .route("/runaiinference", post(handlers::predict_collapse))
        .route("/features", post(handlers::summarize_entropy))
        // Upload endpoints
        .route("/runrealewcltest", post(handlers::analyze_upload))
        .fallback(handle_404)
        // Add state and middleware
        .with_state(state)
        .layer(DefaultBodyLimit::max(upload.max_bytes))
        .layer(cors_layer(cors))
        .layer(TraceLayer::new_for_http())
}

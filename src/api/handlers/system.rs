use axum::{extract::State, Json};

use crate::api::{
    state::AppState,
    types::{LivenessResponse, ModelInfo},
};

/// GET / and GET /health -- static liveness probe
pub async fn liveness(State(state): State<AppState>) -> Json<LivenessResponse> {
    let predictor = &state.predictor;
    Json(LivenessResponse {
        message: "EWCL API is live".to_string(),
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        timestamp: chrono::Utc::now(),
        model: ModelInfo {
            kind: predictor.model_kind().to_string(),
            input_dim: predictor.input_dim(),
            features: predictor.selector().features(),
        },
    })
}

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use tracing::info;

use crate::api::{error::rejection_error, state::AppState, types::EntropyRequest};
use crate::error::Result;
use crate::predictor::{FeatureReport, PredictionResult};

fn entropy_from(payload: std::result::Result<Json<EntropyRequest>, JsonRejection>) -> Result<Vec<f64>> {
    let Json(req) = payload.map_err(|r| rejection_error(r.status(), r.body_text()))?;
    Ok(req.entropy)
}

/// POST /runaiinference
pub async fn predict_collapse(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EntropyRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>> {
    let entropy = entropy_from(payload)?;
    let result = state.predictor.predict(&entropy)?;
    info!(
        n = entropy.len(),
        score = result.predicted_collapse_score,
        "Collapse score predicted"
    );
    Ok(Json(result))
}

/// POST /features
pub async fn summarize_entropy(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EntropyRequest>, JsonRejection>,
) -> Result<Json<FeatureReport>> {
    let entropy = entropy_from(payload)?;
    Ok(Json(state.predictor.features(&entropy)?))
}

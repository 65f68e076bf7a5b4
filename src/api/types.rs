use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::PlaceholderAnalysis;
use crate::features::SummaryFeature;

// ============================================================================
// Inference Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntropyRequest {
    pub entropy: Vec<f64>,
}

// ============================================================================
// Upload Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub filename: String,
    pub result: PlaceholderAnalysis,
}

// ============================================================================
// System Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub kind: String,
    pub input_dim: usize,
    pub features: Vec<SummaryFeature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub message: String,
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
    pub timestamp: DateTime<Utc>,
    pub model: ModelInfo,
}

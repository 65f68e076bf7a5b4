use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;

use crate::analysis::PlaceholderScoring;
use crate::config::AppConfig;
use crate::error::Result;
use crate::predictor::CollapsePredictor;

/// Shared application state for API handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    /// Loaded model plus its feature selection
    pub predictor: Arc<CollapsePredictor>,

    /// Directory for per-request upload temp files
    pub upload_dir: Arc<PathBuf>,

    /// Placeholder scheme for the PDB upload endpoint
    pub scoring: PlaceholderScoring,

    /// Application start time
    pub start_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(predictor: CollapsePredictor, upload_dir: PathBuf, scoring: PlaceholderScoring) -> Self {
        Self {
            predictor: Arc::new(predictor),
            upload_dir: Arc::new(upload_dir),
            scoring,
            start_time: Utc::now(),
        }
    }

    /// Load the model named by `config` and wire up the predictor.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let predictor = CollapsePredictor::from_config(&config.model)?;
        Ok(Self::new(
            predictor,
            config.upload.resolved_temp_dir(),
            config.analysis.scoring,
        ))
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.start_time).num_seconds()
    }
}

pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod features;
pub mod ml;
pub mod predictor;
pub mod upload;

pub use analysis::{analyze_placeholder, PlaceholderAnalysis, PlaceholderScoring, RiskLevel};
pub use config::AppConfig;
pub use error::{EwclError, Result};
pub use features::{FeatureSelector, SummaryFeature, SummaryStatistics};
pub use ml::{ModelFormat, Regressor};
pub use predictor::{round_to, CollapsePredictor, FeatureReport, PredictionResult};

//! Collapse-score predictor: entropy sequence -> summary statistics ->
//! model-specific feature vector -> model -> rounded score.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::ModelConfig;
use crate::error::{EwclError, Result};
use crate::features::{FeatureSelector, SummaryFeature, SummaryStatistics};
use crate::ml::{self, Regressor};

/// Decimal places kept in the returned score.
pub const SCORE_DECIMALS: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_collapse_score: f64,
}

/// Summary statistics together with the vector actually fed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureReport {
    pub statistics: SummaryStatistics,
    pub model_features: Vec<SummaryFeature>,
    pub model_input: Vec<f64>,
}

/// Immutable prediction service built once at startup.
#[derive(Clone)]
pub struct CollapsePredictor {
    model: Arc<dyn Regressor>,
    selector: FeatureSelector,
}

impl std::fmt::Debug for CollapsePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollapsePredictor")
            .field("model", &self.model.kind())
            .field("input_dim", &self.model.input_dim())
            .field("selector", &self.selector)
            .finish()
    }
}

impl CollapsePredictor {
    /// The selector width must equal the model's input width.
    pub fn new(model: Arc<dyn Regressor>, selector: FeatureSelector) -> Result<Self> {
        if selector.width() != model.input_dim() {
            return Err(EwclError::ShapeMismatch {
                expected: model.input_dim(),
                got: selector.width(),
            });
        }
        Ok(Self { model, selector })
    }

    /// Load the configured artifact and feature selection.
    ///
    /// Fails when the artifact is missing or malformed, or when the selection
    /// does not match the model's input width.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let selector = config.selector()?;
        let model = ml::load_model(
            &config.resolved_path(),
            config.resolved_format(),
            selector.width(),
        )?;
        Self::new(model, selector)
    }

    pub fn model_kind(&self) -> &'static str {
        self.model.kind()
    }

    pub fn input_dim(&self) -> usize {
        self.model.input_dim()
    }

    pub fn selector(&self) -> &FeatureSelector {
        &self.selector
    }

    pub fn features(&self, entropy: &[f64]) -> Result<FeatureReport> {
        let statistics = SummaryStatistics::from_values(entropy)?;
        let model_input = self.selector.select_stats(&statistics)?;
        Ok(FeatureReport {
            statistics,
            model_features: self.selector.features(),
            model_input,
        })
    }

    pub fn predict(&self, entropy: &[f64]) -> Result<PredictionResult> {
        let report = self.features(entropy)?;
        debug!(
            n = entropy.len(),
            input = ?report.model_input,
            "Running collapse model"
        );

        let raw = self.model.predict(&report.model_input)?;
        if !raw.is_finite() {
            error!(raw, "Model returned a non-finite prediction");
            return Err(EwclError::Prediction(format!(
                "model returned non-finite value {raw}"
            )));
        }

        Ok(PredictionResult {
            predicted_collapse_score: round_to(raw, SCORE_DECIMALS),
        })
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::MockRegressor;

    fn mock(input_dim: usize, output: f64) -> MockRegressor {
        let mut model = MockRegressor::new();
        model.expect_input_dim().return_const(input_dim);
        model.expect_kind().return_const("mock");
        model.expect_predict().returning(move |_| Ok(output));
        model
    }

    #[test]
    fn rounds_to_three_decimals() {
        assert_eq!(round_to(0.82849, 3), 0.828);
        assert_eq!(round_to(0.8286, 3), 0.829);
        assert_eq!(round_to(-1.23456, 3), -1.235);
    }

    #[test]
    fn predicts_and_rounds() {
        let predictor =
            CollapsePredictor::new(Arc::new(mock(8, 0.82849)), FeatureSelector::all()).unwrap();
        let out = predictor.predict(&[0.1, 0.2, 0.3]).unwrap();
        assert_eq!(out.predicted_collapse_score, 0.828);
    }

    #[test]
    fn passes_selected_features_in_order() {
        let mut model = MockRegressor::new();
        model.expect_input_dim().return_const(4usize);
        model.expect_kind().return_const("mock");
        model
            .expect_predict()
            .withf(|x: &[f64]| {
                x.len() == 4
                    && x[0] == 5.0
                    && x[1] == 3.0
                    && (x[2] - 2f64.sqrt()).abs() < 1e-12
                    && x[3] == 5.0
            })
            .times(1)
            .returning(|_| Ok(0.5));

        let selector = FeatureSelector::from_indices(&[0, 1, 2, 7]).unwrap();
        let predictor = CollapsePredictor::new(Arc::new(model), selector).unwrap();
        let out = predictor.predict(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(out.predicted_collapse_score, 0.5);
    }

    #[test]
    fn selector_width_must_match_model() {
        let err = CollapsePredictor::new(Arc::new(mock(4, 0.0)), FeatureSelector::all())
            .err()
            .unwrap();
        assert!(matches!(
            err,
            EwclError::ShapeMismatch {
                expected: 4,
                got: 8
            }
        ));
    }

    #[test]
    fn empty_entropy_is_input_error() {
        let predictor =
            CollapsePredictor::new(Arc::new(mock(8, 0.1)), FeatureSelector::all()).unwrap();
        assert!(predictor.predict(&[]).unwrap_err().is_client_error());
    }

    #[test]
    fn model_failure_surfaces_as_prediction_error() {
        let mut model = MockRegressor::new();
        model.expect_input_dim().return_const(8usize);
        model.expect_kind().return_const("mock");
        model
            .expect_predict()
            .returning(|_| Err(EwclError::Prediction("tree walk failed".into())));
        let predictor = CollapsePredictor::new(Arc::new(model), FeatureSelector::all()).unwrap();
        assert!(matches!(
            predictor.predict(&[1.0]),
            Err(EwclError::Prediction(_))
        ));
    }

    #[test]
    fn non_finite_output_is_prediction_error() {
        let predictor =
            CollapsePredictor::new(Arc::new(mock(8, f64::NAN)), FeatureSelector::all()).unwrap();
        assert!(matches!(
            predictor.predict(&[1.0]),
            Err(EwclError::Prediction(_))
        ));
    }

    #[test]
    fn feature_report_names_model_inputs() {
        let selector = FeatureSelector::from_indices(&[7, 1]).unwrap();
        let predictor = CollapsePredictor::new(Arc::new(mock(2, 0.0)), selector).unwrap();
        let report = predictor.features(&[2.0, 4.0]).unwrap();
        assert_eq!(
            report.model_features,
            vec![SummaryFeature::Max, SummaryFeature::Mean]
        );
        assert_eq!(report.model_input, vec![4.0, 3.0]);
        assert_eq!(report.statistics.count, 2.0);
    }
}

//! ONNX inference wrapper (pure Rust via `tract-onnx`).
//!
//! Lets a scikit-learn regressor exported with skl2onnx be served without
//! Python in production.

use std::path::Path;

use super::Regressor;
use crate::error::{EwclError, Result};

use tract_onnx::prelude::*;

#[derive(Clone)]
pub struct OnnxModel {
    plan: TypedRunnableModel<TypedModel>,
    input_dim: usize,
}

impl std::fmt::Debug for OnnxModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxModel")
            .field("input_dim", &self.input_dim)
            .finish()
    }
}

impl OnnxModel {
    /// Load an ONNX model and specialize it to a fixed `[1, input_dim]` f32 input.
    pub fn load_for_vec_input(path: &Path, input_dim: usize) -> Result<Self> {
        if input_dim == 0 {
            return Err(EwclError::ModelUnavailable(
                "input_dim must be > 0".to_string(),
            ));
        }

        let unavailable = |stage: &str, e: TractError| {
            EwclError::ModelUnavailable(format!("onnx {stage} failed for {}: {e}", path.display()))
        };

        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| unavailable("load", e))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, input_dim)))
            .map_err(|e| unavailable("input fact", e))?
            .into_optimized()
            .map_err(|e| unavailable("optimize", e))?
            .into_runnable()
            .map_err(|e| unavailable("runnable", e))?;

        let model = Self { plan, input_dim };

        // A dummy forward pass proves the graph yields exactly one value.
        model
            .predict(&vec![0.0; input_dim])
            .map_err(|e| EwclError::ModelUnavailable(format!("onnx smoke test failed: {e}")))?;

        Ok(model)
    }
}

impl Regressor for OnnxModel {
    fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.input_dim {
            return Err(EwclError::ShapeMismatch {
                expected: self.input_dim,
                got: features.len(),
            });
        }

        let input: Vec<f32> = features.iter().map(|v| *v as f32).collect();
        let tensor = tract_ndarray::ArrayD::<f32>::from_shape_vec(
            tract_ndarray::IxDyn(&[1, self.input_dim]),
            input,
        )
        .map_err(|e| EwclError::Prediction(format!("onnx input reshape failed: {e}")))?
        .into_tvalue();

        let outputs = self
            .plan
            .run(tvec!(tensor))
            .map_err(|e| EwclError::Prediction(format!("onnx run failed: {e}")))?;
        let first = outputs
            .first()
            .ok_or_else(|| EwclError::Prediction("onnx produced no outputs".to_string()))?;

        let arr = first
            .to_array_view::<f32>()
            .map_err(|e| EwclError::Prediction(format!("onnx output decode failed: {e}")))?;
        if arr.len() != 1 {
            return Err(EwclError::Prediction(format!(
                "onnx regressor must produce one value, got {}",
                arr.len()
            )));
        }

        arr.iter()
            .next()
            .map(|v| f64::from(*v))
            .ok_or_else(|| EwclError::Prediction("onnx output is empty".to_string()))
    }

    fn kind(&self) -> &'static str {
        "onnx"
    }
}

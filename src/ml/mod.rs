//! Pre-trained model artifacts (deploy-safe inference).
//!
//! The service never trains anything. A model is a file produced elsewhere,
//! loaded once at startup and then only read. Every supported format sits
//! behind [`Regressor`] so the predictor does not care which one is deployed.

pub mod dense;
pub mod forest;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use dense::{Activation, MlpRegressor};
pub use forest::{RegressionTree, TreeEnsemble, TreeNode};
#[cfg(feature = "onnx")]
pub use onnx::OnnxModel;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{EwclError, Result};

/// A loaded model: feature vector in, scalar out.
#[cfg_attr(test, mockall::automock)]
pub trait Regressor: Send + Sync {
    /// Number of features the model was trained on.
    fn input_dim(&self) -> usize;

    /// Predict a single scalar. Implementations must reject inputs whose
    /// length differs from [`Regressor::input_dim`].
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Short artifact format name for logs and the health endpoint.
    fn kind(&self) -> &'static str;
}

/// On-disk artifact format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// JSON tree ensemble (random-forest regressor export).
    Forest,
    /// JSON dense network.
    Dense,
    /// ONNX graph (requires the `onnx` cargo feature).
    Onnx,
}

impl ModelFormat {
    /// Guess the format from the file extension: `.onnx` is ONNX, anything
    /// else is treated as a JSON tree ensemble.
    pub fn infer(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => ModelFormat::Onnx,
            _ => ModelFormat::Forest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFormat::Forest => "forest",
            ModelFormat::Dense => "dense",
            ModelFormat::Onnx => "onnx",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load a model artifact from `path`.
///
/// `input_dim` is only consulted by formats that do not record their own
/// input width (ONNX graphs are specialized to `[1, input_dim]`).
pub fn load_model(path: &Path, format: ModelFormat, input_dim: usize) -> Result<Arc<dyn Regressor>> {
    if !path.is_file() {
        return Err(EwclError::ModelUnavailable(format!(
            "model artifact not found at {}",
            path.display()
        )));
    }

    let model: Arc<dyn Regressor> = match format {
        ModelFormat::Forest => Arc::new(TreeEnsemble::from_file(path)?),
        ModelFormat::Dense => Arc::new(MlpRegressor::from_file(path)?),
        ModelFormat::Onnx => load_onnx(path, input_dim)?,
    };

    info!(
        path = %path.display(),
        format = %format,
        input_dim = model.input_dim(),
        "Loaded model artifact"
    );
    Ok(model)
}

#[cfg(feature = "onnx")]
fn load_onnx(path: &Path, input_dim: usize) -> Result<Arc<dyn Regressor>> {
    Ok(Arc::new(OnnxModel::load_for_vec_input(path, input_dim)?))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(path: &Path, _input_dim: usize) -> Result<Arc<dyn Regressor>> {
    Err(EwclError::ModelUnavailable(format!(
        "{} is an ONNX model but this build lacks the `onnx` feature",
        path.display()
    )))
}

/// Read and parse a JSON artifact, mapping every failure to `ModelUnavailable`.
fn read_json_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        EwclError::ModelUnavailable(format!("cannot read {}: {e}", path.display()))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        EwclError::ModelUnavailable(format!("cannot parse {}: {e}", path.display()))
    })
}

//! Multi-layer perceptron regressor exported to JSON.
//!
//! Mirrors a scikit-learn `MLPRegressor` behind an optional `StandardScaler`:
//!
//! ```json
//! {
//!   "n_features": 8,
//!   "scaler": { "mean": [..], "scale": [..] },
//!   "activation": "relu",
//!   "hidden": [ { "weights": [[..], ..], "bias": [..] } ],
//!   "output": { "weights": [..], "bias": 0.1 }
//! }
//! ```
//!
//! Every hidden layer uses `activation`; the output unit is linear.

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{read_json_artifact, Regressor};
use crate::error::{EwclError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Identity,
    #[default]
    Relu,
    Tanh,
    Logistic,
}

impl Activation {
    fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Identity => x,
            Activation::Relu => x.max(0.0),
            Activation::Tanh => x.tanh(),
            Activation::Logistic => 1.0 / (1.0 + (-x).exp()),
        }
    }
}

/// Per-feature standardization applied before the first layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

/// Fully connected hidden layer, `weights` is `[units][inputs]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiddenLayer {
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputUnit {
    pub weights: Vec<f64>,
    pub bias: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MlpRegressor {
    pub n_features: usize,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    #[serde(default)]
    pub activation: Activation,
    #[serde(default)]
    pub hidden: Vec<HiddenLayer>,
    pub output: OutputUnit,
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|v| v.is_finite())
}

impl MlpRegressor {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let model: Self = read_json_artifact(path)?;
        model.validate().map_err(|e| {
            EwclError::ModelUnavailable(format!("invalid mlp model {}: {e}", path.display()))
        })?;
        Ok(model)
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.n_features == 0 {
            return Err("n_features must be > 0".to_string());
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != self.n_features || scaler.scale.len() != self.n_features {
                return Err(format!("scaler must have {} entries", self.n_features));
            }
            if !all_finite(&scaler.mean) || scaler.scale.iter().any(|s| !s.is_finite() || *s <= 0.0)
            {
                return Err("scaler mean must be finite and scale finite and > 0".to_string());
            }
        }

        let mut width = self.n_features;
        for (idx, layer) in self.hidden.iter().enumerate() {
            if layer.weights.is_empty() || layer.bias.len() != layer.weights.len() {
                return Err(format!(
                    "hidden[{idx}] has {} weight rows and {} biases",
                    layer.weights.len(),
                    layer.bias.len()
                ));
            }
            if layer.weights.iter().any(|row| row.len() != width) {
                return Err(format!("hidden[{idx}] rows must have {width} weights"));
            }
            if !layer.weights.iter().all(|row| all_finite(row)) || !all_finite(&layer.bias) {
                return Err(format!("hidden[{idx}] has non-finite parameters"));
            }
            width = layer.weights.len();
        }

        if self.output.weights.len() != width {
            return Err(format!(
                "output unit has {} weights, previous layer has {width} units",
                self.output.weights.len()
            ));
        }
        if !all_finite(&self.output.weights) || !self.output.bias.is_finite() {
            return Err("output unit has non-finite parameters".to_string());
        }
        Ok(())
    }
}

impl Regressor for MlpRegressor {
    fn input_dim(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != self.n_features {
            return Err(EwclError::ShapeMismatch {
                expected: self.n_features,
                got: features.len(),
            });
        }

        let mut x = match &self.scaler {
            Some(scaler) => features
                .iter()
                .zip(scaler.mean.iter().zip(&scaler.scale))
                .map(|(v, (mean, scale))| (v - mean) / scale)
                .collect(),
            None => features.to_vec(),
        };

        for layer in &self.hidden {
            x = layer
                .weights
                .iter()
                .zip(&layer.bias)
                .map(|(row, bias)| self.activation.apply(bias + dot(row, &x)))
                .collect();
        }

        let y = self.output.bias + dot(&self.output.weights, &x);
        if !y.is_finite() {
            return Err(EwclError::Prediction(format!("mlp produced {y}")));
        }
        Ok(y)
    }

    fn kind(&self) -> &'static str {
        "dense"
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

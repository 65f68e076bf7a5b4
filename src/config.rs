use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::analysis::PlaceholderScoring;
use crate::error::{EwclError, Result};
use crate::features::{FeatureSelector, SummaryFeature};
use crate::ml::ModelFormat;

/// Port used when neither `PORT` nor `server.port` is set.
pub const DEFAULT_PORT: u16 = 10000;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    #[serde(default = "default_host")]
    pub host: String,
    /// Listening port (the `PORT` env var wins over this)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Directory relative model paths are resolved against
    #[serde(default = "default_model_base_dir")]
    pub base_dir: PathBuf,
    /// Model artifact path
    #[serde(default = "default_model_path")]
    pub path: PathBuf,
    /// Artifact format; inferred from the extension when unset
    #[serde(default)]
    pub format: Option<ModelFormat>,
    /// Statistics the model was trained on, by name, in training order
    #[serde(default)]
    pub features: Option<Vec<SummaryFeature>>,
    /// Same as `features`, by position in the 8-element summary vector
    #[serde(default)]
    pub feature_indices: Option<Vec<usize>>,
}

fn default_model_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/collapse_rf_model.json")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_dir: default_model_base_dir(),
            path: default_model_path(),
            format: None,
            features: None,
            feature_indices: None,
        }
    }
}

impl ModelConfig {
    /// Absolute paths are used as-is; relative ones are joined to `base_dir`.
    pub fn resolved_path(&self) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            self.base_dir.join(&self.path)
        }
    }

    pub fn resolved_format(&self) -> ModelFormat {
        self.format
            .unwrap_or_else(|| ModelFormat::infer(&self.resolved_path()))
    }

    /// Feature selection for the deployed model; all 8 statistics when unset.
    pub fn selector(&self) -> Result<FeatureSelector> {
        match (&self.features, &self.feature_indices) {
            (Some(_), Some(_)) => Err(EwclError::InvalidConfig(
                "model.features and model.feature_indices are mutually exclusive".to_string(),
            )),
            (Some(names), None) => FeatureSelector::from_features(names),
            (None, Some(indices)) => FeatureSelector::from_indices(indices),
            (None, None) => Ok(FeatureSelector::all()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `"*"` allows any origin
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o.trim() == "*")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory for per-request temp files; system temp dir when unset
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,
    /// Maximum request body size for uploads
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            temp_dir: None,
            max_bytes: default_max_upload_bytes(),
        }
    }
}

impl UploadConfig {
    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisConfig {
    /// Placeholder scoring used by the PDB upload endpoint
    #[serde(default)]
    pub scoring: PlaceholderScoring,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let mut builder = Config::builder()
            // Start with default values
            .set_default("server.host", default_host())?
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("EWCL_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (EWCL_MODEL__PATH, etc.)
            .add_source(
                Environment::with_prefix("EWCL")
                    .separator("__")
                    .try_parsing(true),
            );

        // Hosting platforms hand out the port through plain `PORT`.
        if let Ok(port) = std::env::var("PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push("server.port must be > 0".to_string());
        }

        if self.model.path.as_os_str().is_empty() {
            errors.push("model.path must not be empty".to_string());
        }

        if let Err(e) = self.model.selector() {
            errors.push(e.to_string());
        }

        if self.cors.allowed_origins.is_empty() {
            errors.push("cors.allowed_origins must list at least one origin".to_string());
        }
        for origin in &self.cors.allowed_origins {
            let origin = origin.trim();
            if origin != "*" && origin.parse::<axum::http::HeaderValue>().is_err() {
                errors.push(format!("cors origin {origin:?} is not a valid header value"));
            }
        }

        if self.upload.max_bytes == 0 {
            errors.push("upload.max_bytes must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(config.validate().is_ok());
        assert_eq!(config.model.selector().unwrap(), FeatureSelector::all());
        assert_eq!(config.model.resolved_format(), ModelFormat::Forest);
    }

    #[test]
    fn relative_model_path_joins_base_dir() {
        let model = ModelConfig {
            base_dir: PathBuf::from("/srv/ewcl"),
            path: PathBuf::from("models/collapse.onnx"),
            ..ModelConfig::default()
        };
        assert_eq!(
            model.resolved_path(),
            PathBuf::from("/srv/ewcl/models/collapse.onnx")
        );
        assert_eq!(model.resolved_format(), ModelFormat::Onnx);

        let absolute = ModelConfig {
            base_dir: PathBuf::from("/srv/ewcl"),
            path: PathBuf::from("/opt/model.json"),
            ..ModelConfig::default()
        };
        assert_eq!(absolute.resolved_path(), PathBuf::from("/opt/model.json"));
    }

    #[test]
    fn selection_by_name_or_index() {
        let by_name = ModelConfig {
            features: Some(vec![
                SummaryFeature::Count,
                SummaryFeature::Mean,
                SummaryFeature::Std,
                SummaryFeature::Max,
            ]),
            ..ModelConfig::default()
        };
        assert_eq!(by_name.selector().unwrap().indices(), &[0, 1, 2, 7]);

        let both = ModelConfig {
            features: Some(vec![SummaryFeature::Count]),
            feature_indices: Some(vec![0]),
            ..ModelConfig::default()
        };
        assert!(both.selector().is_err());
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        config.upload.max_bytes = 0;
        config.model.feature_indices = Some(vec![9]);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.toml"),
            r#"
[model]
path = "models/collapse_rf_model.json"
features = ["length", "mean", "std", "maxEntropy"]

[cors]
allowed_origins = ["https://ewcl.example.org"]

[analysis]
scoring = "random"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.model.selector().unwrap().indices(), &[0, 1, 2, 7]);
        assert_eq!(config.cors.allowed_origins, vec!["https://ewcl.example.org"]);
        assert_eq!(config.analysis.scoring, PlaceholderScoring::Random);
        assert!(!config.cors.allows_any());
    }
}

use thiserror::Error;

/// Main error type for the collapse-score service
#[derive(Error, Debug)]
pub enum EwclError {
    // Client input errors
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    // Model lifecycle errors
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Feature shape mismatch: model expects {expected} features, got {got}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Feature index {index} out of range for vector of length {len}")]
    FeatureIndex { index: usize, len: usize },

    #[error("Prediction failed: {0}")]
    Prediction(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EwclError {
    /// True when the caller sent something unusable (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, EwclError::Input(_) | EwclError::PayloadTooLarge(_))
    }
}

/// Result type alias for EwclError
pub type Result<T> = std::result::Result<T, EwclError>;

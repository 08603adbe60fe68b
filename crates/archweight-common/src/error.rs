use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeightingError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Infeasible cap constraint: {metrics} metrics x cap {cap} < 1")]
    InfeasibleCap { metrics: usize, cap: f64 },

    #[error("Invalid value {value:?} in column '{column}' at row {row}")]
    InvalidValue {
        column: String,
        row: usize,
        value: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WeightingError {
    pub fn config(msg: impl Into<String>) -> Self {
        WeightingError::InvalidConfiguration(msg.into())
    }

    /// Configuration and shape errors abort a run before any computation.
    pub fn is_fatal_config(&self) -> bool {
        matches!(
            self,
            WeightingError::InvalidConfiguration(_) | WeightingError::InfeasibleCap { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, WeightingError>;

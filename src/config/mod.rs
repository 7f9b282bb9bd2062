pub mod types;
pub mod validation;

pub use types::*;
pub use validation::*;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

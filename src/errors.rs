use thiserror::Error;

use crate::config::ConfigError;

/// Result type for decoder construction
pub type DecoderResult<T> = Result<T, DecoderError>;

/// Errors raised while selecting or building a decoder.
///
/// Decoding itself never fails.
#[derive(Debug, Error)]
pub enum DecoderError {
    #[error("Unknown decoder: {0}")]
    UnknownDecoder(String),

    #[error("Invalid decoder configuration: {0}")]
    Config(#[from] ConfigError),
}

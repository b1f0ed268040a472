//! Error types for session state and the wire boundary

use thiserror::Error;

/// Result type alias for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while decoding backend payloads, media or configuration
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Malformed payload: {0}")]
    Malformed(String),

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Malformed(err.to_string())
    }
}

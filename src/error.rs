// Error types for ocr-translate

use thiserror::Error;

use crate::message::DecodeError;
use crate::providers::ProviderError;

/// Result type for ocr-translate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can surface outside a single invocation
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Startup configuration problems; all of them are fatal
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("{0} does not list any target language")]
    NoTargetLanguages(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

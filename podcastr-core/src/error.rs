use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please review it and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Player contract errors
    #[error("Episode index {index} is out of range for a playlist of {len} episode(s)")]
    InvalidIndex { index: usize, len: usize },

    // Catalog errors
    #[error("Episode catalog request failed: {reason}")]
    CatalogFailed { reason: String },

    #[error("Episode not found: {id}")]
    EpisodeNotFound { id: String },

    #[error("Invalid episode record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    // Network errors
    #[error("Network request failed: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Network request failed: {0}")]
    MiddlewareError(#[from] reqwest_middleware::Error),

    // IO errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

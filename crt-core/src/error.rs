use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please edit it and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Now-playing endpoint errors
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Now-playing endpoint returned status {status}")]
    HttpStatus { status: u16 },

    #[error("Invalid now-playing response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Now-playing endpoint reported error: {message}")]
    EndpointReported { message: String },

    // Artwork errors
    #[error("Artwork download returned status {status}")]
    ArtworkStatus { status: u16 },

    #[error("Failed to process artwork image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;

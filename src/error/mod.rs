//! Error handling module for Vidcraft

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for Vidcraft operations
#[derive(Error, Debug)]
pub enum VidcraftError {
    /// Render, export or probe failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON instructions
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML instructions
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Malformed configuration file
    #[error("Invalid configuration file: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// Configuration value out of range
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl VidcraftError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

/// Result type alias for Vidcraft operations
pub type VidcraftResult<T> = std::result::Result<T, VidcraftError>;

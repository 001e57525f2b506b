//! Error types for Glimpse.
//!
//! Analysis failures follow a small fixed taxonomy so the coordinator can
//! translate any of them into a message for the presentation layer.

use crate::types::ProviderId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Failures of a single image analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Resizing or encoding the bitmap failed
    #[error("Invalid image format: {0}")]
    InvalidImage(String),

    /// The provider has no configured key
    #[error("API key not configured for {0}")]
    MissingCredential(ProviderId),

    /// Transport-level failure (DNS, connect, TLS, body read), URL stripped
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// The provider answered with a non-2xx status
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// A 2xx body without the expected text field
    #[error("Invalid response from AI service: {0}")]
    InvalidResponse(String),
}

impl AnalysisError {
    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidImage(_) => ErrorKind::InvalidImage,
            Self::MissingCredential(_) => ErrorKind::MissingCredential,
            Self::Network(_) => ErrorKind::Network,
            Self::Api { .. } => ErrorKind::Api,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }
}

/// Error kinds as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidImage,
    MissingCredential,
    Network,
    Api,
    InvalidResponse,
}

/// A published, human-readable error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&AnalysisError> for ErrorInfo {
    fn from(error: &AnalysisError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

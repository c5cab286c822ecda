//! Error types for the summary-xai-core crate.

use thiserror::Error;

/// Top-level error type for explanation runs.
#[derive(Debug, Error)]
pub enum XaiError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Vectorizer error: {0}")]
    Vectorizer(String),

    #[error("Explainer error: {0}")]
    Explainer(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl XaiError {
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }

    pub fn vectorizer(msg: impl Into<String>) -> Self {
        Self::Vectorizer(msg.into())
    }

    pub fn explainer(msg: impl Into<String>) -> Self {
        Self::Explainer(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, XaiError>;

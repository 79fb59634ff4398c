//! Error types for the minici client

use thiserror::Error;

/// Main error type for the minici client
#[derive(Error, Debug)]
pub enum DeployError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request rejected before contacting the build service
    #[error("{0}")]
    ValidationError(String),

    /// Network failure, non-2xx status or missing body
    #[error("{0}")]
    TransportError(String),

    #[error("A deployment is already in progress")]
    SessionBusy,

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Deployment cancelled")]
    Cancelled,

    #[error("{0}")]
    Timeout(String),
}

impl DeployError {
    /// Whether this error ends a deployment attempt in the `Failed` state
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            DeployError::HttpError(_)
                | DeployError::TransportError(_)
                | DeployError::Cancelled
                | DeployError::Timeout(_)
        )
    }
}

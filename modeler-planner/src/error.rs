//! Error types for planner operations

use thiserror::Error;

/// Result type for planner operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the planner service
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure or error status, after all retries
    #[error("Planner request failed: {message}")]
    Network {
        message: String,
        /// HTTP status of the last response, if one arrived
        status: Option<u16>,
    },

    /// Response did not have the shape of a plan
    #[error("Invalid plan: {0}")]
    Validation(String),

    /// Client could not be set up
    #[error("Planner configuration error: {0}")]
    Config(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Network { .. })
    }

    /// HTTP status attached to a network error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Network { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Config(format!("Invalid planner URL: {}", err))
    }
}

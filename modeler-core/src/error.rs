//! Error types for AI Modeler

use thiserror::Error;

/// Result type alias for modeling operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for modeling operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Execution environment is not usable (no scene, scene not ready)
    #[error("Setup error: {0}")]
    Setup(String),

    /// Step carries an operation tag outside the supported set
    #[error("Unsupported operation: {0}")]
    UnknownOperation(String),

    /// A required step parameter is absent
    #[error("{operation} requires parameter '{key}'")]
    MissingParameter { operation: String, key: String },

    /// A step parameter has the wrong type or an unusable value
    #[error("{operation} parameter '{key}' is invalid: {reason}")]
    InvalidParameter {
        operation: String,
        key: String,
        reason: String,
    },

    /// Referenced scene object does not exist
    #[error("Object '{0}' not found in scene")]
    ObjectNotFound(String),

    /// Material preset is not in the catalog
    #[error("Unknown material preset: {0}")]
    UnknownPreset(String),

    /// The host scene refused an operation
    #[error("Scene error: {0}")]
    Scene(String),
}

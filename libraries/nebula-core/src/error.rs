/// Core error types for Nebula Player
use thiserror::Error;

/// Result type alias using `NebulaError`
pub type Result<T> = std::result::Result<T, NebulaError>;

/// Core error type for Nebula Player
#[derive(Error, Debug)]
pub enum NebulaError {
    /// Backend command failures (load/play/seek/device/engine calls)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Requested file does not exist or cannot be read
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unknown engine identifier
    #[error("Unknown engine: {0}")]
    UnknownEngine(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl NebulaError {
    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

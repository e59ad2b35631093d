/// Storage-specific errors
use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<StorageError> for nebula_core::NebulaError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => nebula_core::NebulaError::Serialization(e),
            StorageError::Io(e) => nebula_core::NebulaError::Io(e),
        }
    }
}

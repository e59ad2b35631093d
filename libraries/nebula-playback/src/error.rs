/// Error types for playback orchestration
use thiserror::Error;

/// Playback errors
///
/// Only caller mistakes surface here. Backend call failures are recovered
/// inside the transport operations and reported as notifications, never
/// propagated to the caller.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Engine switching is locked while a component download runs
    #[error("Engine component download already in progress")]
    EngineDownloadInProgress,

    /// Core error
    #[error(transparent)]
    Core(#[from] nebula_core::NebulaError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Types crossing the backend adapter boundary
use crate::types::ImportedTrack;
use serde::{Deserialize, Serialize};

/// Result of a `switch_engine` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineSwitchStatus {
    /// Engine is installed and now active
    Ready,

    /// Engine component download started; a `BackendEvent::EngineDownload`
    /// with `Ready` status will arrive when the switch can complete
    Downloading,
}

/// Progress of an on-demand engine component download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineDownloadStatus {
    /// Archive is being fetched
    Downloading,

    /// Archive is being unpacked
    Extracting,

    /// Component installed; the pending engine switch can complete
    Ready,

    /// Download or installation failed
    Error,
}

/// Events pushed by the audio backend
///
/// Delivered to the transport controller over a channel; ordering relative
/// to command completions is not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BackendEvent {
    /// A file was imported through the backend's picker
    TrackImported(ImportedTrack),

    /// The import batch finished
    ImportFinished,

    /// Backend-driven seek completion with the authoritative position
    SeekCompleted {
        /// Position in seconds
        position: f64,
    },

    /// Engine component download state change
    EngineDownload(EngineDownloadStatus),

    /// Engine component download progress
    EngineDownloadProgress {
        /// Completion percentage, 0..100
        percent: f32,
    },
}

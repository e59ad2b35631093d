/// Track domain type
use crate::types::TrackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Audio track
///
/// Created when the backend reports an imported file. The path is the
/// identity key for deduplication and never changes; the duration is an
/// estimate from import metadata until the backend loads the file and
/// reports the authoritative value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier, generated at import
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Cover image reference (data URI or path, opaque to the controller)
    pub cover: String,

    /// Track duration in seconds (corrected after the backend loads the file)
    pub duration_secs: f64,

    /// File path on disk, immutable identity key
    pub path: PathBuf,

    /// Whether the file currently exists on disk
    pub available: bool,

    /// When the track was imported
    pub added_at: DateTime<Utc>,
}

impl Track {
    /// Create a track from imported metadata, assigning a fresh id
    pub fn from_imported(imported: ImportedTrack) -> Self {
        Self {
            id: TrackId::generate(),
            title: imported.title,
            artist: imported.artist,
            album: imported.album,
            cover: imported.cover,
            duration_secs: imported.duration_secs,
            path: imported.path,
            available: true,
            added_at: Utc::now(),
        }
    }
}

/// Raw track metadata as reported by the backend's import event
///
/// Carries no identity; the queue assigns a [`TrackId`] on acceptance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportedTrack {
    /// File path on disk
    pub path: PathBuf,

    /// Track title (backend falls back to the file stem)
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name
    pub album: String,

    /// Cover image reference
    pub cover: String,

    /// Duration estimate in seconds from file metadata
    pub duration_secs: f64,
}

/// Core traits for Nebula Player
use crate::error::Result;
use crate::types::{EngineId, EngineSwitchStatus, TrackId};
use async_trait::async_trait;
use std::path::Path;

/// Audio backend adapter
///
/// The command surface of the player's audio backend. Every call is
/// asynchronous and latency-bearing: completions may arrive in any order
/// relative to issuance, and the backend may be mid-way through a prior
/// command when the next one lands. The transport controller treats this
/// as an unreliable RPC peer and serializes intent with session tokens;
/// implementations only need to honor each call independently.
///
/// Backend-initiated notifications (imports, seek completions, engine
/// download progress) are delivered out-of-band as
/// [`crate::types::BackendEvent`] values.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Load a track for playback and return its duration in seconds.
    ///
    /// Loading replaces whatever was previously loaded and leaves the
    /// backend playing from position zero.
    async fn load_track(&self, path: &Path) -> Result<f64>;

    /// Resume playback of the loaded track
    async fn play(&self) -> Result<()>;

    /// Pause playback
    async fn pause(&self) -> Result<()>;

    /// Seek to an absolute position in seconds.
    ///
    /// Note: backends rebuild their output pipeline on seek and commonly
    /// leave it running afterwards, even when it was paused before.
    async fn seek(&self, position: f64) -> Result<()>;

    /// Set output volume, normalized to `0.0..=1.0`
    async fn set_volume(&self, level: f32) -> Result<()>;

    /// Set the output channel layout (2 = stereo, 6 = 5.1, 8 = 7.1)
    async fn set_channel_mode(&self, channels: u16) -> Result<()>;

    /// Route output to the named device; returns a human-readable status
    async fn set_output_device(&self, name: &str) -> Result<String>;

    /// Enumerate available output devices
    async fn list_output_devices(&self) -> Result<Vec<String>>;

    /// Switch the active decoding engine.
    ///
    /// Returns [`EngineSwitchStatus::Downloading`] when the engine needs an
    /// on-demand component download first; the switch then completes after
    /// a `BackendEvent::EngineDownload(Ready)` arrives and the caller
    /// re-issues the switch.
    async fn switch_engine(&self, engine: &EngineId) -> Result<EngineSwitchStatus>;

    /// The engine that is actually active right now
    async fn current_engine(&self) -> Result<EngineId>;

    /// Probe whether a file exists and is readable
    async fn file_exists(&self, path: &Path) -> Result<bool>;

    /// Open the system file picker; imported files arrive as
    /// `BackendEvent::TrackImported` events
    async fn import_music(&self) -> Result<()>;

    /// Fetch raw lyric text for a track, empty when none exists.
    ///
    /// Consumed by the lyric view, not by the transport controller.
    async fn lyrics(&self, path: &Path) -> Result<String>;
}

/// Persistence for the liked-track id set
///
/// The only durable state the player core touches: a flat set of track
/// ids, stored as a JSON array of strings with no versioning.
#[async_trait]
pub trait LikedStore: Send + Sync {
    /// Load the persisted id set (empty when nothing was saved yet)
    async fn load(&self) -> Result<Vec<TrackId>>;

    /// Replace the persisted id set
    async fn save(&self, ids: &[TrackId]) -> Result<()>;
}

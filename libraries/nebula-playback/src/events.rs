//! Player events
//!
//! Event-based communication for UI synchronization. The controller
//! broadcasts these at key points:
//! - Transport flag changes (play/pause/buffering)
//! - Track changes
//! - Position updates (periodic, one per clock tick)
//! - Queue, volume, engine and liked-set changes
//! - User-facing notifications (recovered failures, import completion)

use nebula_core::{EngineId, Notification, Track, TrackId};
use serde::{Deserialize, Serialize};

/// Events emitted by the transport controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlayerEvent {
    /// Transport flags changed
    StateChanged {
        /// Playback intent is active
        playing: bool,
        /// A loaded track is paused
        paused: bool,
        /// Awaiting backend load
        buffering: bool,
    },

    /// A different track became current
    TrackChanged {
        /// The new current track
        track: Track,
    },

    /// Displayed position moved (periodic while playing)
    PositionUpdate {
        /// Position in seconds
        position_secs: f64,
        /// Current track duration in seconds
        duration_secs: f64,
    },

    /// Configured volume level changed
    VolumeChanged {
        /// New level, 0.0..=1.0
        level: f32,
    },

    /// Queue content changed (import, availability refresh)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Displayed engine or its download sub-state changed
    EngineChanged {
        /// Engine shown as active
        engine: EngineId,
        /// Whether a component download is running
        downloading: bool,
    },

    /// Liked-set membership changed
    LikedChanged {
        /// Affected track
        track_id: TrackId,
        /// New membership
        liked: bool,
    },

    /// Transient user-facing notification
    Notice(Notification),
}

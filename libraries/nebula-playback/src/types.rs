//! Core types for playback orchestration

use nebula_core::{EngineId, Track};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Play mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayMode {
    /// Advance through the queue in order, wrapping at the ends
    Sequential,

    /// Repeat the current track forever
    LoopSingle,

    /// Pick a random next track, never the current one twice in a row
    Shuffle,
}

/// Transport state flags
///
/// `playing` and `paused` are never simultaneously true. `buffering`,
/// `seeking` and `dragging` are the interactive locks: while any of them
/// is set the progress clock passes time through without accumulating it
/// and backend position corrections are suppressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportFlags {
    /// Playback intent is active
    pub playing: bool,

    /// A loaded track is paused mid-way
    pub paused: bool,

    /// Awaiting backend load/duration
    pub buffering: bool,

    /// A seek is in flight
    pub seeking: bool,

    /// The user is dragging the progress slider
    pub dragging: bool,
}

impl TransportFlags {
    /// Whether any interactive lock suspends the progress clock
    pub fn interactive_lock(&self) -> bool {
        self.buffering || self.seeking || self.dragging
    }

    /// Flip to the playing state
    pub(crate) fn set_playing(&mut self) {
        self.playing = true;
        self.paused = false;
    }

    /// Flip to the paused state
    pub(crate) fn set_paused(&mut self) {
        self.playing = false;
        self.paused = true;
    }

    /// Whether a track has been loaded at all (cold start detection)
    pub(crate) fn loaded(&self) -> bool {
        self.playing || self.paused
    }
}

/// Engine selection as shown to the user
///
/// `current` is optimistic during a switch; `pending` holds the in-flight
/// download target together with the engine to roll back to on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineView {
    /// Engine displayed as active
    pub current: EngineId,

    /// Download/installation of an engine component is running
    pub downloading: bool,

    /// Download completion percentage, 0..100
    pub download_progress: f32,

    /// Target of a switch that is waiting on a component download
    #[serde(skip)]
    pub(crate) pending: Option<PendingSwitch>,
}

/// In-flight engine switch bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingSwitch {
    /// Engine the switch is heading to
    pub target: EngineId,

    /// Engine that was active before the optimistic switch
    pub previous: EngineId,
}

impl EngineView {
    pub(crate) fn new(current: EngineId) -> Self {
        Self {
            current,
            downloading: false,
            download_progress: 0.0,
            pending: None,
        }
    }
}

/// Configuration for the transport controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Configured volume level, 0.0..=1.0 (default: 0.7)
    pub volume: f32,

    /// Fade-in duration when playback starts or resumes (default: 400 ms)
    pub fade_in: Duration,

    /// Fade-out duration before pausing (default: 250 ms)
    pub fade_out: Duration,

    /// Volume envelope tick interval (default: 30 ms)
    pub envelope_tick: Duration,

    /// Progress clock tick interval (default: 250 ms)
    pub clock_tick: Duration,

    /// Minimum drift before a backend position report resyncs the display
    /// (default: 0.5 s)
    pub drift_tolerance_secs: f64,

    /// Minimum difference before a backend-reported duration replaces the
    /// import-time estimate (default: 0.1 s)
    pub duration_correction_secs: f64,

    /// Engine assumed active before the backend is queried
    pub initial_engine: EngineId,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            volume: 0.7,
            fade_in: Duration::from_millis(400),
            fade_out: Duration::from_millis(250),
            envelope_tick: Duration::from_millis(30),
            clock_tick: Duration::from_millis(250),
            drift_tolerance_secs: 0.5,
            duration_correction_secs: 0.1,
            initial_engine: EngineId::new("builtin"),
        }
    }
}

/// Serializable copy of the shared player state for the rendering layer
#[derive(Debug, Clone, Serialize)]
pub struct PlayerSnapshot {
    /// Current track, if any
    pub track: Option<Track>,

    /// Current queue index
    pub current_index: Option<usize>,

    /// Number of tracks in the queue
    pub queue_len: usize,

    /// Play mode
    pub mode: PlayMode,

    /// Transport flags
    pub flags: TransportFlags,

    /// Displayed playback position in seconds
    pub position_secs: f64,

    /// Duration of the current track in seconds (0 when no track)
    pub duration_secs: f64,

    /// Configured volume level
    pub volume: f32,

    /// Engine selection state
    pub engine: EngineView,
}

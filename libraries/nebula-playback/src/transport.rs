//! Transport controller
//!
//! The orchestrator that owns the shared player state and composes the
//! session manager, volume envelope engine, progress clock and queue into
//! the play/pause/seek/advance operations. Every multi-step operation
//! races an asynchronous, latency-bearing backend: commands complete out
//! of order and new intents arrive while older chains are suspended. The
//! session token is the only serialization mechanism — each chain
//! re-validates its token after every suspension point before committing
//! state or chaining further backend calls, and superseded chains abandon
//! their effects silently.
//!
//! Backend call failures never escape a transport operation: state is
//! reverted to a consistent pre-attempt shape and the failure surfaces as
//! a transient [`Notification`] on the event channel.

use crate::clock::{ClockDriver, ProgressClock, TickAction};
use crate::envelope::Fader;
use crate::error::{PlaybackError, Result};
use crate::events::PlayerEvent;
use crate::queue::Queue;
use crate::session::SessionManager;
use crate::shuffle;
use crate::types::{
    EngineView, PendingSwitch, PlayMode, PlayerConfig, PlayerSnapshot, TransportFlags,
};
use async_trait::async_trait;
use nebula_core::{
    AudioBackend, BackendEvent, EngineDownloadStatus, EngineId, EngineSwitchStatus, ImportedTrack,
    LikedStore, Notification, Track, TrackId,
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard, OnceLock, PoisonError, Weak};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, info, warn};

/// Shared observable player state
///
/// Written exclusively by the transport controller; the rendering layer
/// only ever sees copies via [`PlayerSnapshot`] and [`PlayerEvent`].
struct PlayerState {
    queue: Queue,
    flags: TransportFlags,
    position_secs: f64,
    volume: f32,
    engine: EngineView,
    liked: HashSet<TrackId>,
}

enum Direction {
    Next,
    Previous,
}

pub(crate) struct PlayerInner {
    backend: Arc<dyn AudioBackend>,
    config: PlayerConfig,
    state: StdMutex<PlayerState>,
    sessions: SessionManager,
    fader: Fader,
    clock: ProgressClock,
    events: broadcast::Sender<PlayerEvent>,
    liked_store: StdMutex<Option<Arc<dyn LikedStore>>>,
    audio_initialized: AtomicBool,
    weak_self: OnceLock<Weak<PlayerInner>>,
}

/// Transport controller handle
///
/// Cheap to clone; all clones share one player.
#[derive(Clone)]
pub struct Player {
    inner: Arc<PlayerInner>,
}

impl Player {
    /// Create a player driving the given backend
    pub fn new(backend: Arc<dyn AudioBackend>, config: PlayerConfig) -> Self {
        let (events, _) = broadcast::channel(64);
        let fader = Fader::new(Arc::clone(&backend), config.envelope_tick);
        let clock = ProgressClock::new(config.clock_tick);
        let state = PlayerState {
            queue: Queue::new(),
            flags: TransportFlags::default(),
            position_secs: 0.0,
            volume: config.volume.clamp(0.0, 1.0),
            engine: EngineView::new(config.initial_engine.clone()),
            liked: HashSet::new(),
        };

        let inner = Arc::new(PlayerInner {
            backend,
            config,
            state: StdMutex::new(state),
            sessions: SessionManager::new(),
            fader,
            clock,
            events,
            liked_store: StdMutex::new(None),
            audio_initialized: AtomicBool::new(false),
            weak_self: OnceLock::new(),
        });
        let _ = inner.weak_self.set(Arc::downgrade(&inner));
        Self { inner }
    }

    /// Query the backend for its actual engine to seed the displayed one
    pub async fn init(&self) {
        self.inner.init().await;
    }

    /// Subscribe to player events
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerEvent> {
        self.inner.events.subscribe()
    }

    /// Serializable copy of the current state for the rendering layer
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.inner.snapshot()
    }

    /// Spawn the pump consuming backend-pushed events
    pub fn attach_backend_events(&self, mut rx: mpsc::Receiver<BackendEvent>) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let Some(inner) = weak.upgrade() else { break };
                inner.handle_backend_event(event).await;
            }
        })
    }

    /// Attach (and load from) the liked-track store
    pub async fn attach_liked_store(&self, store: Arc<dyn LikedStore>) {
        self.inner.attach_liked_store(store).await;
    }

    /// Append a track to the queue unless its path is already present
    pub fn import_track(&self, imported: ImportedTrack) -> Option<Track> {
        self.inner.import_track(imported)
    }

    /// All queued tracks in import order
    pub fn tracks(&self) -> Vec<Track> {
        self.inner.state().queue.tracks().to_vec()
    }

    /// Load and play the track at `index`
    pub async fn play_index(&self, index: usize) -> Result<()> {
        self.inner.load_and_play(index).await
    }

    /// Toggle between playing and paused
    ///
    /// Collapses to a Load-and-play of the current (or first) queue entry
    /// when nothing has been loaded yet.
    pub async fn toggle_play(&self) -> Result<()> {
        self.inner.toggle_play().await
    }

    /// Seek to an absolute position in seconds (no-op without a duration)
    pub async fn seek_to(&self, position_secs: f64) {
        self.inner.seek_to(position_secs).await;
    }

    /// Seek to a percentage of the current track
    pub async fn seek_to_percent(&self, percent: f64) {
        self.inner.seek_to_percent(percent).await;
    }

    /// Advance to the next track (mode-aware)
    pub async fn next(&self) -> Result<()> {
        self.inner.advance(Direction::Next).await
    }

    /// Go back to the previous track (mode-aware)
    pub async fn previous(&self) -> Result<()> {
        self.inner.advance(Direction::Previous).await
    }

    /// Current play mode
    pub fn play_mode(&self) -> PlayMode {
        self.inner.state().queue.mode()
    }

    /// Set the play mode
    pub fn set_play_mode(&self, mode: PlayMode) {
        self.inner.state().queue.set_mode(mode);
    }

    /// Set the configured volume level
    ///
    /// Forwarded to the backend unless a fade currently owns the backend
    /// volume; the fade targets the configured level it reads at start.
    pub async fn set_volume(&self, level: f32) {
        self.inner.set_volume(level).await;
    }

    /// Start a progress-slider drag (suspends the clock)
    pub fn begin_drag(&self) {
        self.inner.state().flags.dragging = true;
    }

    /// Update the displayed position while dragging
    pub fn drag_position(&self, position_secs: f64) {
        self.inner.drag_position(position_secs);
    }

    /// Release the drag and seek to the target
    pub async fn end_drag(&self, position_secs: f64) {
        self.inner.end_drag(position_secs).await;
    }

    /// Route output to the named device, preserving play/pause intent
    pub async fn set_output_device(&self, name: &str) {
        self.inner.set_output_device(name).await;
    }

    /// Change the output channel layout, preserving play/pause intent
    pub async fn set_channel_mode(&self, channels: u16) {
        self.inner.set_channel_mode(channels).await;
    }

    /// Enumerate output devices
    pub async fn output_devices(&self) -> Result<Vec<String>> {
        Ok(self.inner.backend.list_output_devices().await?)
    }

    /// Switch the decoding engine
    ///
    /// Fails fast while an engine component download is in progress;
    /// backend failures roll the displayed engine back and notify.
    pub async fn switch_engine(&self, engine: EngineId) -> Result<()> {
        self.inner.switch_engine(engine).await
    }

    /// Open the backend's import picker
    pub async fn import_music(&self) {
        self.inner.import_music().await;
    }

    /// Probe every queued file and update availability flags
    pub async fn refresh_availability(&self) {
        self.inner.refresh_availability().await;
    }

    /// Flip liked-set membership for a track, persisting the new set
    pub async fn toggle_liked(&self, id: &TrackId) -> bool {
        self.inner.toggle_liked(id).await
    }

    /// Whether a track is in the liked set
    pub fn is_liked(&self, id: &TrackId) -> bool {
        self.inner.state().liked.contains(id)
    }

    /// Fetch lyrics for the current track (empty when none)
    pub async fn current_lyrics(&self) -> Result<String> {
        let path = {
            let state = self.inner.state();
            state.queue.current_track().map(|t| t.path.clone())
        };
        match path {
            Some(path) => Ok(self.inner.backend.lyrics(&path).await?),
            None => Ok(String::new()),
        }
    }
}

impl PlayerInner {
    fn state(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn weak(&self) -> Weak<PlayerInner> {
        self.weak_self.get().cloned().unwrap_or_else(Weak::new)
    }

    fn emit(&self, event: PlayerEvent) {
        let _ = self.events.send(event);
    }

    fn emit_state(&self, flags: TransportFlags) {
        self.emit(PlayerEvent::StateChanged {
            playing: flags.playing,
            paused: flags.paused,
            buffering: flags.buffering,
        });
    }

    fn notify(&self, notification: Notification) {
        self.emit(PlayerEvent::Notice(notification));
    }

    fn start_clock(&self) {
        self.clock.start(self.weak());
    }

    async fn init(&self) {
        match self.backend.current_engine().await {
            Ok(engine) => {
                self.state().engine.current = engine;
            }
            Err(e) => debug!(error = %e, "engine query failed, keeping configured default"),
        }
    }

    fn snapshot(&self) -> PlayerSnapshot {
        let state = self.state();
        PlayerSnapshot {
            track: state.queue.current_track().cloned(),
            current_index: state.queue.current_index(),
            queue_len: state.queue.len(),
            mode: state.queue.mode(),
            flags: state.flags,
            position_secs: state.position_secs,
            duration_secs: state.queue.current_track().map_or(0.0, |t| t.duration_secs),
            volume: state.volume,
            engine: state.engine.clone(),
        }
    }

    fn import_track(&self, imported: ImportedTrack) -> Option<Track> {
        let (track, length) = {
            let mut state = self.state();
            let track = state.queue.import(imported).cloned();
            (track, state.queue.len())
        };
        if let Some(ref track) = track {
            debug!(track = %track.id, title = %track.title, "track imported");
            self.emit(PlayerEvent::QueueChanged { length });
        }
        track
    }

    // ===== Load-and-play =====

    async fn load_and_play(&self, index: usize) -> Result<()> {
        let token = self.sessions.begin();

        // Optimistic flags before any backend round-trip: the interface
        // must react even though the load takes a while.
        let (track, prior_duration) = {
            let mut state = self.state();
            if !self.sessions.is_current(token) {
                return Ok(());
            }
            let Some(track) = state.queue.select(index) else {
                return Err(PlaybackError::IndexOutOfBounds(index));
            };
            let track = track.clone();
            state.flags.set_playing();
            state.flags.buffering = true;
            state.flags.seeking = false;
            state.position_secs = 0.0;
            self.emit_state(state.flags);
            (track.clone(), track.duration_secs)
        };
        self.emit(PlayerEvent::TrackChanged {
            track: track.clone(),
        });
        debug!(track = %track.id, title = %track.title, "loading track");

        // One-time output wake-up before the very first playback
        if !self.audio_initialized.swap(true, Ordering::SeqCst) {
            let _ = self.backend.pause().await;
            debug!("audio output warmed up");
        }

        // Silence before the load so the outgoing track never pops into
        // the incoming one
        self.fader.abort();
        if let Err(e) = self.backend.set_volume(0.0).await {
            warn!(error = %e, "failed to silence volume before load");
        }
        if !self.sessions.is_current(token) {
            debug!(track = %track.id, "load superseded before backend call");
            return Ok(());
        }

        match self.backend.load_track(&track.path).await {
            Ok(duration) => {
                if !self.sessions.is_current(token) {
                    debug!(track = %track.id, "load superseded mid-flight");
                    return Ok(());
                }
                let (volume, duration_secs) = {
                    let mut state = self.state();
                    if (duration - prior_duration).abs() > self.config.duration_correction_secs {
                        if let Some(current) = state.queue.current_track_mut() {
                            current.duration_secs = duration;
                        }
                    }
                    state.flags.buffering = false;
                    self.emit_state(state.flags);
                    let duration_secs = state
                        .queue
                        .current_track()
                        .map_or(duration, |t| t.duration_secs);
                    (state.volume, duration_secs)
                };
                self.emit(PlayerEvent::PositionUpdate {
                    position_secs: 0.0,
                    duration_secs,
                });
                self.start_clock();
                self.fader.fade(0.0, volume, self.config.fade_in).await;
                Ok(())
            }
            Err(e) => {
                if !self.sessions.is_current(token) {
                    return Ok(());
                }
                warn!(track = %track.id, error = %e, "track load failed");
                self.clock.stop();
                let volume = {
                    let mut state = self.state();
                    state.flags.playing = false;
                    state.flags.paused = false;
                    state.flags.buffering = false;
                    self.emit_state(state.flags);
                    state.volume
                };
                // Restore the configured backend volume so a later play
                // is not silently muted by the pre-load silence
                let _ = self.backend.set_volume(volume).await;
                self.notify(Notification::error(format!(
                    "Could not play \"{}\"",
                    track.title
                )));
                Ok(())
            }
        }
    }

    // ===== Play / pause =====

    async fn toggle_play(&self) -> Result<()> {
        let (loaded, playing, volume) = {
            let state = self.state();
            (state.flags.loaded(), state.flags.playing, state.volume)
        };

        if !loaded {
            // Cold start: nothing has been loaded yet
            let index = {
                let state = self.state();
                if state.queue.is_empty() {
                    return Err(PlaybackError::QueueEmpty);
                }
                state.queue.current_index().unwrap_or(0)
            };
            return self.load_and_play(index).await;
        }

        let token = self.sessions.current();
        if playing {
            self.fader.fade(volume, 0.0, self.config.fade_out).await;
            if !self.sessions.is_current(token) {
                return Ok(());
            }
            if let Err(e) = self.backend.pause().await {
                warn!(error = %e, "pause failed");
                let _ = self.backend.set_volume(volume).await;
                self.notify(Notification::error("Pause failed"));
                return Ok(());
            }
            self.clock.stop();
            let mut state = self.state();
            state.flags.set_paused();
            self.emit_state(state.flags);
        } else {
            if let Err(e) = self.backend.set_volume(0.0).await {
                warn!(error = %e, "failed to silence volume before resume");
            }
            if !self.sessions.is_current(token) {
                return Ok(());
            }
            if let Err(e) = self.backend.play().await {
                warn!(error = %e, "resume failed");
                let _ = self.backend.set_volume(volume).await;
                self.notify(Notification::error("Resume failed"));
                return Ok(());
            }
            {
                let mut state = self.state();
                state.flags.set_playing();
                self.emit_state(state.flags);
            }
            self.start_clock();
            self.fader.fade(0.0, volume, self.config.fade_in).await;
        }
        Ok(())
    }

    // ===== Seek =====

    async fn seek_to(&self, target_secs: f64) {
        let (duration, was_playing) = {
            let state = self.state();
            let duration = state.queue.current_track().map_or(0.0, |t| t.duration_secs);
            (duration, state.flags.playing)
        };
        if duration <= 0.0 {
            return;
        }
        let target = target_secs.clamp(0.0, duration);

        let token = self.sessions.begin();
        {
            let mut state = self.state();
            if !self.sessions.is_current(token) {
                return;
            }
            state.flags.seeking = true;
            state.position_secs = target;
        }
        self.emit(PlayerEvent::PositionUpdate {
            position_secs: target,
            duration_secs: duration,
        });

        match self.backend.seek(target).await {
            Ok(()) => {
                if !self.sessions.is_current(token) {
                    debug!("seek superseded");
                    return;
                }
                self.state().flags.seeking = false;
                if was_playing {
                    self.start_clock();
                } else {
                    // The backend rebuilds its output pipeline on seek and
                    // leaves it running; a paused transport must be
                    // re-asserted or the track becomes audible.
                    let _ = self.backend.pause().await;
                }
            }
            Err(e) => {
                if self.sessions.is_current(token) {
                    self.state().flags.seeking = false;
                    warn!(error = %e, "seek failed");
                    self.notify(Notification::error("Seek failed"));
                }
            }
        }
    }

    async fn seek_to_percent(&self, percent: f64) {
        let duration = {
            let state = self.state();
            state.queue.current_track().map_or(0.0, |t| t.duration_secs)
        };
        if duration <= 0.0 {
            return;
        }
        self.seek_to(percent.clamp(0.0, 100.0) / 100.0 * duration)
            .await;
    }

    fn drag_position(&self, position_secs: f64) {
        let mut state = self.state();
        if state.flags.dragging {
            let duration = state.queue.current_track().map_or(0.0, |t| t.duration_secs);
            state.position_secs = position_secs.clamp(0.0, duration);
        }
    }

    async fn end_drag(&self, position_secs: f64) {
        self.state().flags.dragging = false;
        self.seek_to(position_secs).await;
    }

    // ===== Next / previous =====

    async fn advance(&self, direction: Direction) -> Result<()> {
        let target = {
            let state = self.state();
            let queue = &state.queue;
            if queue.is_empty() {
                return Err(PlaybackError::QueueEmpty);
            }
            match queue.mode() {
                PlayMode::Shuffle => {
                    let mut rng = rand::thread_rng();
                    shuffle::pick_next_index(queue.len(), queue.current_index(), &mut rng)
                }
                _ => match direction {
                    Direction::Next => queue.next_index(),
                    Direction::Previous => queue.previous_index(),
                },
            }
        };
        match target {
            Some(index) => self.load_and_play(index).await,
            None => Err(PlaybackError::QueueEmpty),
        }
    }

    // ===== Volume =====

    async fn set_volume(&self, level: f32) {
        let level = level.clamp(0.0, 1.0);
        self.state().volume = level;
        self.emit(PlayerEvent::VolumeChanged { level });

        // A running fade owns the backend volume; it reads the configured
        // level when it starts, so the slider and the envelope never fight
        // over the last write.
        if self.fader.is_active() {
            debug!("fade in flight, backend volume deferred");
            return;
        }
        if let Err(e) = self.backend.set_volume(level).await {
            warn!(error = %e, "volume set failed");
            self.notify(Notification::error("Volume change failed"));
        }
    }

    // ===== Device / channel reconfiguration =====

    async fn set_output_device(&self, name: &str) {
        let token = self.sessions.current();
        let (was_paused, position) = {
            let state = self.state();
            (!state.flags.playing, state.position_secs)
        };

        match self.backend.set_output_device(name).await {
            Ok(status) => {
                if !self.sessions.is_current(token) {
                    return;
                }
                // The new routing only applies after a seek to the
                // current position
                let _ = self.backend.seek(position).await;
                if !self.sessions.is_current(token) {
                    return;
                }
                // Reconfiguration can implicitly resume the backend;
                // re-assert the user's intent either way
                if was_paused {
                    let _ = self.backend.pause().await;
                } else {
                    let _ = self.backend.play().await;
                }
                info!(device = name, "output device switched");
                self.notify(Notification::info(status));
            }
            Err(e) => {
                warn!(device = name, error = %e, "device switch failed");
                self.notify(Notification::error(format!("Could not switch to {name}")));
            }
        }
    }

    async fn set_channel_mode(&self, channels: u16) {
        let token = self.sessions.current();
        let (was_paused, position) = {
            let state = self.state();
            (!state.flags.playing, state.position_secs)
        };

        match self.backend.set_channel_mode(channels).await {
            Ok(()) => {
                if !self.sessions.is_current(token) {
                    return;
                }
                let _ = self.backend.seek(position).await;
                if !self.sessions.is_current(token) {
                    return;
                }
                if was_paused {
                    let _ = self.backend.pause().await;
                } else {
                    let _ = self.backend.play().await;
                }
                info!(channels, "channel mode updated");
            }
            Err(e) => {
                warn!(channels, error = %e, "channel mode change failed");
                self.notify(Notification::error("Could not change channel mode"));
            }
        }
    }

    // ===== Engine switching =====

    async fn switch_engine(&self, engine: EngineId) -> Result<()> {
        let previous = {
            let mut state = self.state();
            if state.engine.downloading {
                return Err(PlaybackError::EngineDownloadInProgress);
            }
            let previous = state.engine.current.clone();
            // Optimistic: the UI shows the target immediately
            state.engine.current = engine.clone();
            state.engine.pending = Some(PendingSwitch {
                target: engine.clone(),
                previous: previous.clone(),
            });
            previous
        };
        self.emit(PlayerEvent::EngineChanged {
            engine: engine.clone(),
            downloading: false,
        });
        info!(engine = %engine, "switching engine");

        match self.backend.switch_engine(&engine).await {
            Ok(EngineSwitchStatus::Ready) => {
                {
                    let mut state = self.state();
                    state.engine.pending = None;
                    state.engine.downloading = false;
                }
                self.resume_after_engine_switch().await;
                self.notify(Notification::info(format!("Engine {engine} ready")));
                Ok(())
            }
            Ok(EngineSwitchStatus::Downloading) => {
                {
                    let mut state = self.state();
                    state.engine.downloading = true;
                    state.engine.download_progress = 0.0;
                }
                self.emit(PlayerEvent::EngineChanged {
                    engine,
                    downloading: true,
                });
                self.notify(Notification::info("Downloading engine component"));
                Ok(())
            }
            Err(e) => {
                warn!(engine = %engine, error = %e, "engine switch failed");
                self.rollback_engine(previous).await;
                self.notify(Notification::error(format!(
                    "Could not switch to engine {engine}"
                )));
                Ok(())
            }
        }
    }

    /// Roll the displayed engine back to whatever the backend actually runs
    async fn rollback_engine(&self, fallback: EngineId) {
        let actual = self.backend.current_engine().await.unwrap_or(fallback);
        {
            let mut state = self.state();
            state.engine.current = actual.clone();
            state.engine.pending = None;
            state.engine.downloading = false;
            state.engine.download_progress = 0.0;
        }
        self.emit(PlayerEvent::EngineChanged {
            engine: actual,
            downloading: false,
        });
    }

    /// After a completed switch, reload the current track at its previous
    /// position on the new engine and restore the play/pause state
    async fn resume_after_engine_switch(&self) {
        let (loaded, was_playing, position, track) = {
            let state = self.state();
            (
                state.flags.loaded(),
                state.flags.playing,
                state.position_secs,
                state.queue.current_track().cloned(),
            )
        };
        let Some(track) = track else { return };
        if !loaded {
            return;
        }

        let token = self.sessions.begin();
        {
            let mut state = self.state();
            if !self.sessions.is_current(token) {
                return;
            }
            state.flags.buffering = true;
            self.emit_state(state.flags);
        }
        self.fader.abort();
        let _ = self.backend.set_volume(0.0).await;
        if !self.sessions.is_current(token) {
            return;
        }

        match self.backend.load_track(&track.path).await {
            Ok(duration) => {
                if !self.sessions.is_current(token) {
                    return;
                }
                let _ = self.backend.seek(position).await;
                if !self.sessions.is_current(token) {
                    return;
                }
                let volume = {
                    let mut state = self.state();
                    if (duration - track.duration_secs).abs() > self.config.duration_correction_secs
                    {
                        if let Some(current) = state.queue.current_track_mut() {
                            current.duration_secs = duration;
                        }
                    }
                    state.flags.buffering = false;
                    self.emit_state(state.flags);
                    state.volume
                };
                if was_playing {
                    let _ = self.backend.play().await;
                    self.start_clock();
                    self.fader.fade(0.0, volume, self.config.fade_in).await;
                } else {
                    let _ = self.backend.pause().await;
                    let _ = self.backend.set_volume(volume).await;
                }
            }
            Err(e) => {
                if !self.sessions.is_current(token) {
                    return;
                }
                warn!(track = %track.id, error = %e, "reload on new engine failed");
                self.clock.stop();
                let volume = {
                    let mut state = self.state();
                    state.flags.playing = false;
                    state.flags.paused = false;
                    state.flags.buffering = false;
                    self.emit_state(state.flags);
                    state.volume
                };
                let _ = self.backend.set_volume(volume).await;
                self.notify(Notification::error(format!(
                    "Could not resume \"{}\" on the new engine",
                    track.title
                )));
            }
        }
    }

    /// Complete a switch that was waiting on a component download
    async fn complete_pending_switch(&self) {
        let pending = { self.state().engine.pending.clone() };
        let Some(pending) = pending else {
            self.state().engine.downloading = false;
            return;
        };
        info!(engine = %pending.target, "engine component ready, completing switch");

        match self.backend.switch_engine(&pending.target).await {
            Ok(EngineSwitchStatus::Ready) => {
                {
                    let mut state = self.state();
                    state.engine.current = pending.target.clone();
                    state.engine.pending = None;
                    state.engine.downloading = false;
                    state.engine.download_progress = 100.0;
                }
                self.emit(PlayerEvent::EngineChanged {
                    engine: pending.target.clone(),
                    downloading: false,
                });
                self.resume_after_engine_switch().await;
                self.notify(Notification::info(format!(
                    "Engine {} ready",
                    pending.target
                )));
            }
            Ok(EngineSwitchStatus::Downloading) | Err(_) => {
                warn!(engine = %pending.target, "engine switch failed after download");
                self.rollback_engine(pending.previous).await;
                self.notify(Notification::error("Engine switch failed"));
            }
        }
    }

    async fn handle_engine_download(&self, status: EngineDownloadStatus) {
        match status {
            EngineDownloadStatus::Downloading | EngineDownloadStatus::Extracting => {
                self.state().engine.downloading = true;
            }
            EngineDownloadStatus::Ready => self.complete_pending_switch().await,
            EngineDownloadStatus::Error => {
                let fallback = {
                    let state = self.state();
                    state.engine.pending.as_ref().map(|p| p.previous.clone())
                };
                let Some(fallback) = fallback else {
                    self.state().engine.downloading = false;
                    return;
                };
                warn!("engine component download failed");
                self.rollback_engine(fallback).await;
                self.notify(Notification::error("Engine download failed"));
            }
        }
    }

    // ===== Backend events =====

    async fn handle_backend_event(&self, event: BackendEvent) {
        match event {
            BackendEvent::TrackImported(imported) => {
                self.import_track(imported);
            }
            BackendEvent::ImportFinished => {
                let length = self.state().queue.len();
                self.notify(Notification::info(format!(
                    "Import complete, {length} tracks in library"
                )));
            }
            BackendEvent::SeekCompleted { position } => {
                // Authoritative position, but only worth applying when no
                // interactive lock is held and the drift is visible
                let update = {
                    let mut state = self.state();
                    if state.flags.interactive_lock() {
                        None
                    } else if (position - state.position_secs).abs()
                        > self.config.drift_tolerance_secs
                    {
                        state.position_secs = position;
                        let duration =
                            state.queue.current_track().map_or(0.0, |t| t.duration_secs);
                        Some(duration)
                    } else {
                        None
                    }
                };
                if let Some(duration_secs) = update {
                    debug!(position, "resynced position from backend");
                    self.emit(PlayerEvent::PositionUpdate {
                        position_secs: position,
                        duration_secs,
                    });
                }
            }
            BackendEvent::EngineDownload(status) => self.handle_engine_download(status).await,
            BackendEvent::EngineDownloadProgress { percent } => {
                self.state().engine.download_progress = percent.clamp(0.0, 100.0);
            }
        }
    }

    // ===== Liked tracks =====

    fn store(&self) -> Option<Arc<dyn LikedStore>> {
        self.liked_store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn attach_liked_store(&self, store: Arc<dyn LikedStore>) {
        match store.load().await {
            Ok(ids) => {
                self.state().liked = ids.into_iter().collect();
            }
            Err(e) => warn!(error = %e, "failed to load liked tracks"),
        }
        *self
            .liked_store
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(store);
    }

    async fn toggle_liked(&self, id: &TrackId) -> bool {
        let (liked, ids) = {
            let mut state = self.state();
            let liked = if state.liked.remove(id) {
                false
            } else {
                state.liked.insert(id.clone());
                true
            };
            let ids: Vec<TrackId> = state.liked.iter().cloned().collect();
            (liked, ids)
        };
        self.emit(PlayerEvent::LikedChanged {
            track_id: id.clone(),
            liked,
        });

        if let Some(store) = self.store() {
            if let Err(e) = store.save(&ids).await {
                warn!(error = %e, "failed to persist liked tracks");
                self.notify(Notification::error("Could not save liked tracks"));
            }
        }
        liked
    }

    // ===== Library =====

    async fn import_music(&self) {
        if let Err(e) = self.backend.import_music().await {
            warn!(error = %e, "import failed to start");
            self.notify(Notification::error("Could not open the import dialog"));
        }
    }

    async fn refresh_availability(&self) {
        let targets: Vec<(TrackId, PathBuf)> = {
            let state = self.state();
            state
                .queue
                .tracks()
                .iter()
                .map(|t| (t.id.clone(), t.path.clone()))
                .collect()
        };

        let mut changed = false;
        for (id, path) in targets {
            let available = self.backend.file_exists(&path).await.unwrap_or(false);
            changed |= self.state().queue.set_available(&id, available);
        }
        if changed {
            let length = self.state().queue.len();
            self.emit(PlayerEvent::QueueChanged { length });
        }
    }
}

#[async_trait]
impl ClockDriver for PlayerInner {
    fn apply_tick(&self, dt: Duration) -> TickAction {
        let (action, update) = {
            let mut state = self.state();
            if !state.flags.playing || state.flags.interactive_lock() {
                // Pass-through tick: the delta is consumed without
                // accumulating, so releasing the lock never double-counts
                return TickAction::Continue;
            }
            let Some(duration) = state.queue.current_track().map(|t| t.duration_secs) else {
                return TickAction::Continue;
            };
            state.position_secs += dt.as_secs_f64();

            if duration > 0.0 && state.position_secs >= duration {
                if state.queue.mode() == PlayMode::LoopSingle {
                    state.position_secs = 0.0;
                    (TickAction::LoopRestart, None)
                } else {
                    (TickAction::Advance, None)
                }
            } else {
                (
                    TickAction::Continue,
                    Some((state.position_secs, duration)),
                )
            }
        };
        if let Some((position_secs, duration_secs)) = update {
            self.emit(PlayerEvent::PositionUpdate {
                position_secs,
                duration_secs,
            });
        }
        action
    }

    async fn on_loop_restart(&self) {
        debug!("looping current track");
        if let Err(e) = self.backend.seek(0.0).await {
            warn!(error = %e, "loop restart seek failed");
        }
        let duration_secs = {
            let state = self.state();
            state.queue.current_track().map_or(0.0, |t| t.duration_secs)
        };
        self.emit(PlayerEvent::PositionUpdate {
            position_secs: 0.0,
            duration_secs,
        });
    }

    fn on_track_end(&self) {
        if let Some(inner) = self.weak().upgrade() {
            tokio::spawn(async move {
                if let Err(e) = inner.advance(Direction::Next).await {
                    debug!(error = %e, "track advance skipped");
                }
            });
        }
    }
}

//! Scripted backend double for transport tests
//!
//! Records every command and lets tests script per-path load latency,
//! durations, failures, and engine-switch outcomes, so races between
//! asynchronous chains can be reproduced deterministically under paused
//! virtual time.

#![allow(dead_code)]

use async_trait::async_trait;
use nebula_core::{
    AudioBackend, EngineId, EngineSwitchStatus, ImportedTrack, NebulaError, Result,
};
use nebula_playback::PlayerEvent;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;
use tokio::time::Duration;

/// One recorded backend command
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Load(PathBuf),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    SetChannelMode(u16),
    SetOutputDevice(String),
    SwitchEngine(EngineId),
}

/// Scripted outcome for a `switch_engine` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchResult {
    Ready,
    Downloading,
    Fail,
}

pub struct ScriptedBackend {
    calls: Mutex<Vec<BackendCall>>,
    durations: Mutex<HashMap<PathBuf, f64>>,
    load_delays: Mutex<HashMap<PathBuf, Duration>>,
    failing_loads: Mutex<HashSet<PathBuf>>,
    seek_delay: Mutex<Duration>,
    switch_script: Mutex<VecDeque<SwitchResult>>,
    engine: Mutex<EngineId>,
    missing: Mutex<HashSet<PathBuf>>,
    fail_devices: Mutex<bool>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            durations: Mutex::new(HashMap::new()),
            load_delays: Mutex::new(HashMap::new()),
            failing_loads: Mutex::new(HashSet::new()),
            seek_delay: Mutex::new(Duration::ZERO),
            switch_script: Mutex::new(VecDeque::new()),
            engine: Mutex::new(EngineId::new("builtin")),
            missing: Mutex::new(HashSet::new()),
            fail_devices: Mutex::new(false),
        }
    }

    fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        m.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Scripting =====

    pub fn set_duration(&self, path: impl Into<PathBuf>, secs: f64) {
        Self::lock(&self.durations).insert(path.into(), secs);
    }

    pub fn set_load_delay(&self, path: impl Into<PathBuf>, delay: Duration) {
        Self::lock(&self.load_delays).insert(path.into(), delay);
    }

    pub fn fail_load(&self, path: impl Into<PathBuf>) {
        Self::lock(&self.failing_loads).insert(path.into());
    }

    pub fn set_seek_delay(&self, delay: Duration) {
        *Self::lock(&self.seek_delay) = delay;
    }

    pub fn script_switch(&self, result: SwitchResult) {
        Self::lock(&self.switch_script).push_back(result);
    }

    pub fn mark_missing(&self, path: impl Into<PathBuf>) {
        Self::lock(&self.missing).insert(path.into());
    }

    pub fn fail_devices(&self) {
        *Self::lock(&self.fail_devices) = true;
    }

    // ===== Inspection =====

    pub fn calls(&self) -> Vec<BackendCall> {
        Self::lock(&self.calls).clone()
    }

    /// Commands excluding the (chatty) volume writes
    pub fn transport_calls(&self) -> Vec<BackendCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, BackendCall::SetVolume(_)))
            .collect()
    }

    /// Recorded volume levels in write order
    pub fn volume_levels(&self) -> Vec<f32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                BackendCall::SetVolume(level) => Some(level),
                _ => None,
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        Self::lock(&self.calls).clear();
    }

    fn record(&self, call: BackendCall) {
        Self::lock(&self.calls).push(call);
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioBackend for ScriptedBackend {
    async fn load_track(&self, path: &Path) -> Result<f64> {
        self.record(BackendCall::Load(path.to_path_buf()));
        let delay = Self::lock(&self.load_delays)
            .get(path)
            .copied()
            .unwrap_or(Duration::ZERO);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if Self::lock(&self.failing_loads).contains(path) {
            return Err(NebulaError::backend(format!(
                "cannot decode {}",
                path.display()
            )));
        }
        Ok(Self::lock(&self.durations).get(path).copied().unwrap_or(100.0))
    }

    async fn play(&self) -> Result<()> {
        self.record(BackendCall::Play);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        self.record(BackendCall::Pause);
        Ok(())
    }

    async fn seek(&self, position: f64) -> Result<()> {
        self.record(BackendCall::Seek(position));
        let delay = *Self::lock(&self.seek_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn set_volume(&self, level: f32) -> Result<()> {
        self.record(BackendCall::SetVolume(level));
        Ok(())
    }

    async fn set_channel_mode(&self, channels: u16) -> Result<()> {
        self.record(BackendCall::SetChannelMode(channels));
        if *Self::lock(&self.fail_devices) {
            return Err(NebulaError::backend("channel mode rejected"));
        }
        Ok(())
    }

    async fn set_output_device(&self, name: &str) -> Result<String> {
        self.record(BackendCall::SetOutputDevice(name.to_string()));
        if *Self::lock(&self.fail_devices) {
            return Err(NebulaError::backend("device unavailable"));
        }
        Ok(format!("Switched to {name}"))
    }

    async fn list_output_devices(&self) -> Result<Vec<String>> {
        Ok(vec!["Default".to_string(), "Speakers".to_string()])
    }

    async fn switch_engine(&self, engine: &EngineId) -> Result<EngineSwitchStatus> {
        self.record(BackendCall::SwitchEngine(engine.clone()));
        let scripted = Self::lock(&self.switch_script).pop_front();
        match scripted.unwrap_or(SwitchResult::Ready) {
            SwitchResult::Ready => {
                *Self::lock(&self.engine) = engine.clone();
                Ok(EngineSwitchStatus::Ready)
            }
            SwitchResult::Downloading => Ok(EngineSwitchStatus::Downloading),
            SwitchResult::Fail => Err(NebulaError::UnknownEngine(engine.to_string())),
        }
    }

    async fn current_engine(&self) -> Result<EngineId> {
        Ok(Self::lock(&self.engine).clone())
    }

    async fn file_exists(&self, path: &Path) -> Result<bool> {
        Ok(!Self::lock(&self.missing).contains(path))
    }

    async fn import_music(&self) -> Result<()> {
        Ok(())
    }

    async fn lyrics(&self, _path: &Path) -> Result<String> {
        Ok(String::new())
    }
}

/// Build import metadata for a test track
pub fn imported(path: &str, title: &str, duration_secs: f64) -> ImportedTrack {
    ImportedTrack {
        path: PathBuf::from(path),
        title: title.to_string(),
        artist: "Test Artist".to_string(),
        album: "Test Album".to_string(),
        cover: "DEFAULT_COVER".to_string(),
        duration_secs,
    }
}

/// Drain everything currently buffered on an event subscription
pub fn drain_events(rx: &mut broadcast::Receiver<PlayerEvent>) -> Vec<PlayerEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(broadcast::error::TryRecvError::Lagged(_)) => {}
            Err(_) => break,
        }
    }
    events
}

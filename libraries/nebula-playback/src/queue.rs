//! Playback queue
//!
//! Ordered track storage with a current-position index. Insertion order is
//! import order and storage is never reordered in place; navigation (next,
//! previous, shuffle) only reassigns the index. Import deduplicates on the
//! file path, which is the track's identity key.

use crate::types::PlayMode;
use nebula_core::{ImportedTrack, Track, TrackId};
use std::path::Path;

/// Ordered queue of tracks with a current index
///
/// Invariant: the index is within bounds or `None` when the queue is empty.
#[derive(Debug, Clone)]
pub struct Queue {
    tracks: Vec<Track>,
    current: Option<usize>,
    mode: PlayMode,
}

impl Queue {
    /// Create a new empty queue
    pub fn new() -> Self {
        Self {
            tracks: Vec::new(),
            current: None,
            mode: PlayMode::Sequential,
        }
    }

    /// Append an imported track unless its path is already present
    ///
    /// Returns the accepted track (with its freshly generated id), or
    /// `None` for a duplicate path.
    pub fn import(&mut self, imported: ImportedTrack) -> Option<&Track> {
        if self.contains_path(&imported.path) {
            return None;
        }
        self.tracks.push(Track::from_imported(imported));
        self.tracks.last()
    }

    /// Whether a track with the given path is already queued
    pub fn contains_path(&self, path: &Path) -> bool {
        self.tracks.iter().any(|t| t.path == path)
    }

    /// All tracks in import order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Number of tracks
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Current index, if any
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Current track, if any
    pub fn current_track(&self) -> Option<&Track> {
        self.current.and_then(|i| self.tracks.get(i))
    }

    /// Mutable access to the current track (duration correction)
    pub fn current_track_mut(&mut self) -> Option<&mut Track> {
        self.current.and_then(|i| self.tracks.get_mut(i))
    }

    /// Track at an index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Find a track by id
    pub fn find(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.iter().find(|t| &t.id == id)
    }

    /// Make the track at `index` current
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index < self.tracks.len() {
            self.current = Some(index);
            self.tracks.get(index)
        } else {
            None
        }
    }

    /// Index after the current one, wrapping at the end
    pub fn next_index(&self) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        Some(self.current.map_or(0, |i| (i + 1) % len))
    }

    /// Index before the current one, wrapping at the start
    pub fn previous_index(&self) -> Option<usize> {
        let len = self.tracks.len();
        if len == 0 {
            return None;
        }
        Some(self.current.map_or(0, |i| (i + len - 1) % len))
    }

    /// Current play mode
    pub fn mode(&self) -> PlayMode {
        self.mode
    }

    /// Set the play mode
    pub fn set_mode(&mut self, mode: PlayMode) {
        self.mode = mode;
    }

    /// Update availability flags from a probe result
    ///
    /// Returns whether any flag changed.
    pub fn set_available(&mut self, id: &TrackId, available: bool) -> bool {
        if let Some(track) = self.tracks.iter_mut().find(|t| &t.id == id) {
            if track.available != available {
                track.available = available;
                return true;
            }
        }
        false
    }
}

impl Default for Queue {
    fn default() -> Self {
        Self::new()
    }
}

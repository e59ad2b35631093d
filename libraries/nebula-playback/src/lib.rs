//! Nebula Player - Playback Orchestration
//!
//! The transport controller for Nebula Player: the component that decides
//! what should be audible right now while racing an asynchronous,
//! latency-bearing audio backend.
//!
//! This crate provides:
//! - Transport control (play/pause, seek, next/previous, drag)
//! - Session tokens that discard superseded asynchronous chains
//! - Volume fade envelopes for click-free transitions
//! - A progress clock simulating the playback position between backend
//!   position reports
//! - An ordered import queue with sequential/loop/shuffle navigation
//! - Engine switching with the download/install sub-state machine
//! - Device and channel reconfiguration that preserves play/pause intent
//!
//! # Architecture
//!
//! `nebula-playback` is completely backend-agnostic: the audio backend is
//! whatever implements [`nebula_core::AudioBackend`], and its pushed
//! events arrive over a channel handed to
//! [`Player::attach_backend_events`]. The controller owns all shared
//! transport state; the rendering layer reads it through
//! [`Player::snapshot`] and the [`PlayerEvent`] stream and never mutates
//! it directly.
//!
//! # Example
//!
//! ```rust,no_run
//! use nebula_playback::{Player, PlayerConfig, PlayMode};
//! use nebula_core::AudioBackend;
//! use std::sync::Arc;
//!
//! # async fn example(backend: Arc<dyn AudioBackend>) -> Result<(), Box<dyn std::error::Error>> {
//! let player = Player::new(backend, PlayerConfig::default());
//! player.init().await;
//!
//! let mut events = player.subscribe();
//!
//! player.set_play_mode(PlayMode::Shuffle);
//! player.play_index(0).await?;
//! player.seek_to_percent(50.0).await;
//! player.next().await?;
//! # Ok(())
//! # }
//! ```

mod clock;
mod envelope;
mod error;
mod events;
mod queue;
mod session;
mod shuffle;
mod transport;
pub mod types;

// Public exports
pub use error::{PlaybackError, Result};
pub use events::PlayerEvent;
pub use queue::Queue;
pub use session::{SessionManager, SessionToken};
pub use shuffle::pick_next_index;
pub use transport::Player;
pub use types::{PlayMode, PlayerConfig, PlayerSnapshot, TransportFlags};

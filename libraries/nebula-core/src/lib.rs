//! Nebula Player Core
//!
//! Platform-agnostic core types, traits, and error handling for Nebula
//! Player.
//!
//! The core crate defines:
//! - **Domain Types**: [`Track`], [`TrackId`], [`EngineId`], [`Notification`]
//! - **Core Traits**: [`AudioBackend`] (the asynchronous backend adapter the
//!   transport controller orchestrates) and [`LikedStore`] (persistence for
//!   the liked-track id set)
//! - **Error Handling**: unified [`NebulaError`] and [`Result`] types
//!
//! The audio backend itself lives outside this workspace; `nebula-playback`
//! drives it exclusively through the [`AudioBackend`] trait and consumes its
//! pushed [`BackendEvent`]s.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{NebulaError, Result};
pub use traits::{AudioBackend, LikedStore};
pub use types::{
    BackendEvent, EngineDownloadStatus, EngineId, EngineSwitchStatus, ImportedTrack, Notification,
    Severity, Track, TrackId,
};

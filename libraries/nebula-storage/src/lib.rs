//! Nebula Player Storage
//!
//! Local persistence for Nebula Player. The player core keeps exactly one
//! piece of durable state: the set of liked track ids, stored as a JSON
//! array in a key-value style file. Everything else (queue, transport
//! flags, engine choice) is process-lifetime state rebuilt on launch.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;

pub mod favorites;

pub use error::{Result, StorageError};
pub use favorites::FavoritesFile;

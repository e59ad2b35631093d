//! Liked-track persistence
//!
//! Stores the set of liked track ids as a flat JSON array of strings in a
//! single file, reloaded at startup and rewritten on every change. There is
//! no versioning; an unreadable file is treated as empty rather than fatal.
//!
//! # Example
//!
//! ```rust,no_run
//! use nebula_storage::favorites::FavoritesFile;
//! use nebula_core::{LikedStore, TrackId};
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = FavoritesFile::new("/data/liked.json");
//! let mut ids = store.load().await?;
//! ids.push(TrackId::generate());
//! store.save(&ids).await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, StorageError};
use async_trait::async_trait;
use nebula_core::{LikedStore, TrackId};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// File-backed liked-track store
#[derive(Debug, Clone)]
pub struct FavoritesFile {
    path: PathBuf,
}

impl FavoritesFile {
    /// Create a store backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_ids(&self) -> Result<Vec<TrackId>> {
        match fs::read(&self.path).await {
            Ok(bytes) => {
                let ids: Vec<String> = serde_json::from_slice(&bytes)?;
                Ok(ids.into_iter().map(TrackId::new).collect())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn write_ids(&self, ids: &[TrackId]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let raw: Vec<&str> = ids.iter().map(TrackId::as_str).collect();
        let bytes = serde_json::to_vec(&raw)?;
        fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl LikedStore for FavoritesFile {
    async fn load(&self) -> nebula_core::Result<Vec<TrackId>> {
        match self.read_ids().await {
            Ok(ids) => Ok(ids),
            Err(StorageError::Serialization(e)) => {
                // A corrupt file loses the likes but must not brick startup
                warn!(path = %self.path.display(), error = %e, "liked-track file unreadable, starting empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, ids: &[TrackId]) -> nebula_core::Result<()> {
        self.write_ids(ids).await.map_err(Into::into)
    }
}

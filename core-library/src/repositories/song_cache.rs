//! Single-generation cache of the last fetched song list

use crate::error::{LibraryError, Result};
use crate::models::Song;
use async_trait::async_trait;
use bridge_traits::storage::SettingsStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Settings key holding the cached songs unless configured otherwise
pub const DEFAULT_CACHE_KEY: &str = "cachedSongs";

/// Song cache repository interface
#[async_trait]
pub trait SongCacheRepository: Send + Sync {
    /// Load the cached songs
    ///
    /// # Returns
    /// - `Ok(Some(songs))` if a copy was stored
    /// - `Ok(None)` if the cache is empty
    /// - `Err(LibraryError::Corrupted)` if the stored copy cannot be decoded;
    ///   the corrupted entry is removed
    async fn load(&self) -> Result<Option<Vec<Song>>>;

    /// Replace the cached copy with `songs`
    async fn save(&self, songs: &[Song]) -> Result<()>;
}

/// [`SongCacheRepository`] stored under a single [`SettingsStore`] key
#[derive(Clone)]
pub struct StoreSongCacheRepository {
    store: Arc<dyn SettingsStore>,
    key: String,
}

impl StoreSongCacheRepository {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_key(store, DEFAULT_CACHE_KEY)
    }

    pub fn with_key(store: Arc<dyn SettingsStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

#[async_trait]
impl SongCacheRepository for StoreSongCacheRepository {
    async fn load(&self) -> Result<Option<Vec<Song>>> {
        let Some(raw) = self.store.get_string(&self.key).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Vec<Song>>(&raw) {
            Ok(songs) => {
                debug!(count = songs.len(), "Loaded cached songs");
                Ok(Some(songs))
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Cached songs are corrupted, discarding");

                if let Err(delete_err) = self.store.delete(&self.key).await {
                    warn!(key = %self.key, error = %delete_err, "Failed to delete corrupted cache");
                }

                Err(LibraryError::Corrupted {
                    key: self.key.clone(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn save(&self, songs: &[Song]) -> Result<()> {
        let json = serde_json::to_string(songs).map_err(|e| LibraryError::Serialization {
            context: "cached songs".to_string(),
            source: e,
        })?;

        self.store.set_string(&self.key, &json).await?;
        debug!(count = songs.len(), bytes = json.len(), "Cached songs");
        Ok(())
    }
}

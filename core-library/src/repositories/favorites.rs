//! Favorite song ids persisted as a JSON array of strings

use crate::error::{LibraryError, Result};
use async_trait::async_trait;
use bridge_traits::storage::SettingsStore;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Settings key holding the favorites unless configured otherwise
pub const DEFAULT_FAVORITES_KEY: &str = "favoriteSongs";

/// Favorites repository interface
#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Load the persisted favorite ids
    ///
    /// # Returns
    /// - `Ok(set)` with the stored ids, empty if nothing was ever saved
    /// - `Err(LibraryError::Corrupted)` if the stored value is not a JSON string array
    async fn load(&self) -> Result<BTreeSet<String>>;

    /// Overwrite the persisted set with `ids`
    async fn save(&self, ids: &BTreeSet<String>) -> Result<()>;
}

/// [`FavoritesRepository`] stored under a single [`SettingsStore`] key
#[derive(Clone)]
pub struct StoreFavoritesRepository {
    store: Arc<dyn SettingsStore>,
    key: String,
}

impl StoreFavoritesRepository {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self::with_key(store, DEFAULT_FAVORITES_KEY)
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
impl FavoritesRepository for StoreFavoritesRepository {
    async fn load(&self) -> Result<BTreeSet<String>> {
        let Some(raw) = self.store.get_string(&self.key).await? else {
            debug!(key = %self.key, "No favorites stored");
            return Ok(BTreeSet::new());
        };

        let ids: Vec<String> = serde_json::from_str(&raw).map_err(|e| {
            warn!(key = %self.key, error = %e, "Stored favorites are corrupted");
            LibraryError::Corrupted {
                key: self.key.clone(),
                reason: e.to_string(),
            }
        })?;

        let ids: BTreeSet<String> = ids.into_iter().collect();
        info!(count = ids.len(), "Favorites loaded");
        Ok(ids)
    }

    async fn save(&self, ids: &BTreeSet<String>) -> Result<()> {
        let json = serde_json::to_string(ids).map_err(|e| LibraryError::Serialization {
            context: "favorite ids".to_string(),
            source: e,
        })?;

        self.store.set_string(&self.key, &json).await.map_err(|e| {
            warn!(key = %self.key, error = %e, "Failed to persist favorites");
            LibraryError::from(e)
        })?;

        debug!(count = ids.len(), "Favorites saved");
        Ok(())
    }
}

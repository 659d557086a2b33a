//! # Repository Pattern Implementation
//!
//! Repository traits and their `SettingsStore`-backed implementations.
//!
//! ## Available Repositories
//!
//! - `FavoritesRepository` - The set of favorite song ids
//! - `SongCacheRepository` - The last successfully fetched song list

pub mod favorites;
pub mod song_cache;

pub use favorites::{FavoritesRepository, StoreFavoritesRepository, DEFAULT_FAVORITES_KEY};
pub use song_cache::{SongCacheRepository, StoreSongCacheRepository, DEFAULT_CACHE_KEY};

/// In-memory [`SettingsStore`](bridge_traits::storage::SettingsStore) for tests
/// in this and dependent crates (`test-support` feature).
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result};
    use bridge_traits::storage::SettingsStore;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// In-memory store with a switch that makes every write fail.
    #[derive(Default)]
    pub struct MemoryStore {
        values: Mutex<HashMap<String, String>>,
        fail_writes: AtomicBool,
    }

    impl MemoryStore {
        pub fn with_value(key: &str, value: &str) -> Self {
            let store = Self::default();
            store.set_raw(key, value);
            store
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        pub fn raw(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }

        /// Overwrite `key` bypassing the write switch
        pub fn set_raw(&self, key: &str, value: &str) {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
    }

    #[async_trait]
    impl SettingsStore for MemoryStore {
        async fn set_string(&self, key: &str, value: &str) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(BridgeError::OperationFailed("disk full".to_string()));
            }
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> Result<Vec<String>> {
            Ok(self.values.lock().unwrap().keys().cloned().collect())
        }

        async fn clear_all(&self) -> Result<()> {
            self.values.lock().unwrap().clear();
            Ok(())
        }
    }
}

//! # Song Catalog Service
//!
//! Holds the in-memory catalog (songs, favorite ids, search results, loading
//! flag) and the operations hosts drive it with.
//!
//! ## Features
//!
//! - Single `GET` of the song list, replacing `songs` wholesale on success
//! - Stale-while-revalidate: an empty catalog is seeded from the cached copy
//!   while the request is in flight
//! - Favorites persisted on every toggle
//! - Derived views (top songs, favorites, search) recomputed on read
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_catalog::SongCatalogService;
//!
//! let outcome = catalog.fetch_popular_songs().await?;
//! for song in catalog.top_songs() {
//!     println!("{} - {} ({})", song.title(), song.artist(), song.formatted_views());
//! }
//! ```
//!
//! ## Concurrency
//!
//! State sits behind a `parking_lot::RwLock` that is never held across an
//! `.await`. Operations may interleave with a suspended fetch; the last write
//! to `songs`/`is_loading` wins unless
//! [`FetchOverlapPolicy::SkipWhileInFlight`] is configured.

use crate::error::{CatalogError, Result};
use bridge_traits::http::{HttpClient, HttpRequest, RetryPolicy};
use core_library::models::Song;
use core_library::repositories::{FavoritesRepository, SongCacheRepository};
use core_runtime::config::{CatalogConfig, FetchOverlapPolicy};
use core_runtime::events::{CatalogEvent, EventBus, SongsSource};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

// =============================================================================
// Core Types
// =============================================================================

/// Result of [`SongCatalogService::fetch_popular_songs`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// `songs` was replaced with `count` songs from the endpoint
    Fetched { count: usize },
    /// Another fetch was in flight and the overlap policy skips
    Skipped,
}

/// Point-in-time copy of the whole catalog state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSnapshot {
    pub songs: Vec<Song>,
    pub favorite_ids: BTreeSet<String>,
    pub search_results: Vec<Song>,
    pub is_loading: bool,
}

#[derive(Default)]
struct CatalogState {
    songs: Vec<Song>,
    favorite_ids: BTreeSet<String>,
    search_results: Vec<Song>,
    is_loading: bool,
}

/// Marks a fetch as in flight until dropped
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// =============================================================================
// Service
// =============================================================================

/// The song catalog view model.
///
/// Constructed explicitly and shared by `Arc`; there is no global instance.
pub struct SongCatalogService {
    http_client: Arc<dyn HttpClient>,
    favorites_repo: Arc<dyn FavoritesRepository>,
    cache_repo: Arc<dyn SongCacheRepository>,
    config: CatalogConfig,
    events: EventBus,
    state: RwLock<CatalogState>,
    fetch_in_flight: AtomicBool,
}

impl SongCatalogService {
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        favorites_repo: Arc<dyn FavoritesRepository>,
        cache_repo: Arc<dyn SongCacheRepository>,
        config: CatalogConfig,
        events: EventBus,
    ) -> Self {
        debug!(endpoint = %config.endpoint_url, "Initializing SongCatalogService");
        Self {
            http_client,
            favorites_repo,
            cache_repo,
            config,
            events,
            state: RwLock::new(CatalogState::default()),
            fetch_in_flight: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // -------------------------------------------------------------------------
    // Fetch
    // -------------------------------------------------------------------------

    /// Fetch the song list from the configured endpoint.
    ///
    /// On success `songs` is replaced and the list is written to the cache.
    /// On failure `songs` is left untouched and the error is returned; in
    /// both cases `is_loading` ends up `false`.
    ///
    /// # Returns
    /// * `Ok(FetchOutcome::Fetched { count })` on success
    /// * `Ok(FetchOutcome::Skipped)` if another fetch is in flight and the
    ///   overlap policy is `SkipWhileInFlight`
    /// * `Err(CatalogError::Network)` / `Err(CatalogError::Decode)` on failure
    #[instrument(skip(self), fields(endpoint = %self.config.endpoint_url))]
    pub async fn fetch_popular_songs(&self) -> Result<FetchOutcome> {
        let _guard = match self.config.overlap_policy {
            FetchOverlapPolicy::LastWriteWins => None,
            FetchOverlapPolicy::SkipWhileInFlight => {
                match InFlightGuard::try_acquire(&self.fetch_in_flight) {
                    Some(guard) => Some(guard),
                    None => {
                        debug!("Fetch already in flight, skipping");
                        return Ok(FetchOutcome::Skipped);
                    }
                }
            }
        };

        self.set_loading(true);

        if self.config.cache_enabled {
            self.seed_from_cache().await;
        }

        match self.request_songs().await {
            Ok(songs) => {
                let count = songs.len();

                if self.config.cache_enabled {
                    if let Err(e) = self.cache_repo.save(&songs).await {
                        warn!(error = %e, "Failed to cache fetched songs");
                    }
                }

                self.state.write().songs = songs;
                self.emit(CatalogEvent::SongsReplaced {
                    count,
                    source: SongsSource::Network,
                });
                self.set_loading(false);

                info!(count = count, "Fetched songs");
                Ok(FetchOutcome::Fetched { count })
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch songs");
                self.set_loading(false);
                self.emit(CatalogEvent::FetchFailed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn request_songs(&self) -> Result<Vec<Song>> {
        let request = HttpRequest::get(self.config.endpoint_url.as_str())
            .accept_json()
            .header("User-Agent", self.config.user_agent.as_str())
            .timeout(self.config.request_timeout);

        let response = self
            .http_client
            .execute_with_retry(request, RetryPolicy::single_attempt())
            .await
            .map_err(|e| CatalogError::Network(e.to_string()))?;

        if !response.is_success() {
            let kind = if response.is_client_error() {
                "client error"
            } else if response.is_server_error() {
                "server error"
            } else {
                "unexpected status"
            };
            return Err(CatalogError::Network(format!(
                "HTTP {} ({}) from {}",
                response.status, kind, self.config.endpoint_url
            )));
        }

        serde_json::from_slice::<Vec<Song>>(&response.body).map_err(|e| {
            let head: String = response
                .text()
                .map(|text| text.chars().take(64).collect())
                .unwrap_or_default();
            debug!(bytes = response.body.len(), head = %head, "Undecodable song list");
            CatalogError::Decode(e.to_string())
        })
    }

    /// Fill an empty catalog from the cached copy. Failures only log.
    async fn seed_from_cache(&self) {
        if !self.state.read().songs.is_empty() {
            return;
        }

        let cached = match self.cache_repo.load().await {
            Ok(Some(songs)) if !songs.is_empty() => songs,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable song cache");
                return;
            }
        };

        let count = cached.len();
        {
            let mut state = self.state.write();
            // A concurrent fetch may have filled the catalog meanwhile
            if !state.songs.is_empty() {
                return;
            }
            state.songs = cached;
        }

        debug!(count = count, "Seeded songs from cache");
        self.emit(CatalogEvent::SongsReplaced {
            count,
            source: SongsSource::Cache,
        });
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Case-insensitive substring search on title or artist, in `songs` order.
    ///
    /// An empty query yields no results. The result is also kept as
    /// [`search_results`](Self::search_results).
    pub fn search_songs(&self, query: &str) -> Vec<Song> {
        let results: Vec<Song> = if query.is_empty() {
            Vec::new()
        } else {
            let needle = query.to_lowercase();
            self.state
                .read()
                .songs
                .iter()
                .filter(|song| song.matches_lowercase(&needle))
                .cloned()
                .collect()
        };

        self.state.write().search_results = results.clone();

        debug!(result_count = results.len(), "Search updated");
        self.emit(CatalogEvent::SearchUpdated {
            query: query.to_string(),
            result_count: results.len(),
        });

        results
    }

    pub fn clear_search(&self) {
        self.state.write().search_results.clear();
        self.emit(CatalogEvent::SearchUpdated {
            query: String::new(),
            result_count: 0,
        });
    }

    // -------------------------------------------------------------------------
    // Favorites
    // -------------------------------------------------------------------------

    /// Replace the favorite set with the persisted one.
    ///
    /// A missing key yields an empty set. A corrupted value leaves the
    /// in-memory set untouched and returns `CatalogError::Persistence`.
    pub async fn load_favorites(&self) -> Result<usize> {
        match self.favorites_repo.load().await {
            Ok(ids) => {
                let count = ids.len();
                self.state.write().favorite_ids = ids;
                info!(count = count, "Loaded favorites");
                self.emit(CatalogEvent::FavoritesLoaded { count });
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load favorites, keeping current set");
                Err(e.into())
            }
        }
    }

    /// Flip the favorite membership of `song` and persist the whole set.
    ///
    /// Returns the new membership. If persisting fails the flip is undone and
    /// the error returned.
    pub async fn toggle_favorite(&self, song: &Song) -> Result<bool> {
        let song_id = song.id().to_string();

        let (is_favorite, ids) = {
            let mut state = self.state.write();
            let is_favorite = if state.favorite_ids.remove(&song_id) {
                false
            } else {
                state.favorite_ids.insert(song_id.clone());
                true
            };
            (is_favorite, state.favorite_ids.clone())
        };

        if let Err(e) = self.favorites_repo.save(&ids).await {
            warn!(song_id = %song_id, error = %e, "Failed to persist favorites, reverting");
            let mut state = self.state.write();
            if is_favorite {
                state.favorite_ids.remove(&song_id);
            } else {
                state.favorite_ids.insert(song_id);
            }
            return Err(e.into());
        }

        info!(song_id = %song_id, is_favorite = is_favorite, total = ids.len(), "Favorite toggled");
        self.emit(CatalogEvent::FavoriteToggled {
            song_id,
            is_favorite,
            total: ids.len(),
        });

        Ok(is_favorite)
    }

    pub fn is_favorite(&self, song: &Song) -> bool {
        self.state.read().favorite_ids.contains(song.id())
    }

    /// Current songs whose id is a favorite, in `songs` order.
    ///
    /// Favorite ids without a matching song are ignored.
    pub fn favorites(&self) -> Vec<Song> {
        let state = self.state.read();
        state
            .songs
            .iter()
            .filter(|song| state.favorite_ids.contains(song.id()))
            .cloned()
            .collect()
    }

    // -------------------------------------------------------------------------
    // Derived views & accessors
    // -------------------------------------------------------------------------

    /// Songs by descending view count, ties in server order, at most
    /// `top_songs_limit` entries.
    pub fn top_songs(&self) -> Vec<Song> {
        let mut songs = self.state.read().songs.clone();
        songs.sort_by(|a, b| b.view_count().cmp(&a.view_count()));
        songs.truncate(self.config.top_songs_limit);
        songs
    }

    /// Lyrics preview at the configured length
    pub fn preview(&self, song: &Song) -> String {
        song.preview_text(self.config.preview_length)
    }

    pub fn songs(&self) -> Vec<Song> {
        self.state.read().songs.clone()
    }

    pub fn search_results(&self) -> Vec<Song> {
        self.state.read().search_results.clone()
    }

    pub fn favorite_ids(&self) -> BTreeSet<String> {
        self.state.read().favorite_ids.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.read().is_loading
    }

    pub fn find_song(&self, id: &str) -> Option<Song> {
        self.state
            .read()
            .songs
            .iter()
            .find(|song| song.id() == id)
            .cloned()
    }

    pub fn snapshot(&self) -> CatalogSnapshot {
        let state = self.state.read();
        CatalogSnapshot {
            songs: state.songs.clone(),
            favorite_ids: state.favorite_ids.clone(),
            search_results: state.search_results.clone(),
            is_loading: state.is_loading,
        }
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn set_loading(&self, is_loading: bool) {
        self.state.write().is_loading = is_loading;
        self.emit(CatalogEvent::LoadingChanged { is_loading });
    }

    fn emit(&self, event: CatalogEvent) {
        // No subscribers is fine
        self.events.emit(event).ok();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::HttpResponse;
    use bytes::Bytes;
    use core_library::repositories::test_support::MemoryStore;
    use core_library::repositories::{StoreFavoritesRepository, StoreSongCacheRepository};
    use mockall::mock;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    mock! {
        pub Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> bridge_traits::error::Result<HttpResponse>;
        }
    }

    /// Holds the n-th request until gate n is opened, then answers with body n
    struct GatedHttp {
        gates: Vec<Notify>,
        bodies: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl GatedHttp {
        fn new(bodies: Vec<&'static str>) -> Self {
            Self {
                gates: bodies.iter().map(|_| Notify::new()).collect(),
                bodies,
                calls: AtomicUsize::new(0),
            }
        }

        fn open(&self, n: usize) {
            self.gates[n].notify_one();
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn wait_for_calls(&self, n: usize) {
            while self.calls() < n {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl HttpClient for GatedHttp {
        async fn execute(&self, _request: HttpRequest) -> bridge_traits::error::Result<HttpResponse> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.gates[n].notified().await;
            Ok(ok_response(self.bodies[n]))
        }
    }

    const TWO_SONGS: &str = r#"[
        {"id":"1","title":"A","artist":"X","lyrics":"la la","category":"Pop","views":"5000","created_at":"","updated_at":""},
        {"id":"2","title":"B","artist":"Y","lyrics":"na na","category":"Rock","views":"500000","created_at":"","updated_at":""}
    ]"#;

    const THREE_SONGS: &str = r#"[
        {"id":"1","title":"Hello","artist":"Adele","views":"100"},
        {"id":"2","title":"Halo","artist":"Beyonce","views":"300"},
        {"id":"3","title":"Yellow","artist":"Coldplay","views":"200"}
    ]"#;

    fn ok_response(body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: HashMap::new(),
            body: Bytes::from(body.to_string()),
        }
    }

    fn status_response(status: u16) -> HttpResponse {
        HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::new(),
        }
    }

    /// Mock answering each request with the next scripted response
    fn scripted(responses: Vec<bridge_traits::error::Result<HttpResponse>>) -> MockHttp {
        let expected = responses.len();
        let script = Mutex::new(responses.into_iter());
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(expected)
            .returning(move |_| script.lock().unwrap().next().unwrap());
        http
    }

    fn service_with(
        http: Arc<dyn HttpClient>,
        store: Arc<MemoryStore>,
        config: CatalogConfig,
    ) -> SongCatalogService {
        SongCatalogService::new(
            http,
            Arc::new(StoreFavoritesRepository::with_key(
                store.clone(),
                config.favorites_key.clone(),
            )),
            Arc::new(StoreSongCacheRepository::with_key(
                store,
                config.cache_key.clone(),
            )),
            config,
            EventBus::default(),
        )
    }

    fn service(http: MockHttp, store: Arc<MemoryStore>) -> SongCatalogService {
        service_with(Arc::new(http), store, CatalogConfig::default())
    }

    fn ids(songs: &[Song]) -> Vec<&str> {
        songs.iter().map(|s| s.id()).collect()
    }

    #[tokio::test]
    async fn test_fetch_then_top_songs_by_views() {
        let store = Arc::new(MemoryStore::default());
        let catalog = service(scripted(vec![Ok(ok_response(TWO_SONGS))]), store);

        let outcome = catalog.fetch_popular_songs().await.unwrap();

        assert_eq!(outcome, FetchOutcome::Fetched { count: 2 });
        assert_eq!(ids(&catalog.songs()), vec!["1", "2"]);
        assert_eq!(ids(&catalog.top_songs()), vec!["2", "1"]);
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn test_request_shape() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .withf(|request| {
                request.url == "https://devlk.com/lyricsv1.php"
                    && request.headers.get("Accept").map(String::as_str) == Some("application/json")
                    && request.headers.contains_key("User-Agent")
            })
            .times(1)
            .returning(|_| Ok(ok_response("[]")));

        let catalog = service(http, Arc::new(MemoryStore::default()));
        assert_eq!(
            catalog.fetch_popular_songs().await.unwrap(),
            FetchOutcome::Fetched { count: 0 }
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_keeps_songs() {
        let store = Arc::new(MemoryStore::default());
        let catalog = service(
            scripted(vec![
                Ok(ok_response(THREE_SONGS)),
                Err(BridgeError::OperationFailed("Connection refused".to_string())),
                Ok(status_response(500)),
                Ok(ok_response("<html>oops</html>")),
                Ok(status_response(404)),
            ]),
            store,
        );

        catalog.fetch_popular_songs().await.unwrap();
        assert_eq!(catalog.songs().len(), 3);

        let err = catalog.fetch_popular_songs().await.unwrap_err();
        assert!(matches!(err, CatalogError::Network(_)));
        assert_eq!(catalog.songs().len(), 3);
        assert!(!catalog.is_loading());

        let err = catalog.fetch_popular_songs().await.unwrap_err();
        assert!(
            matches!(err, CatalogError::Network(ref msg) if msg.contains("500") && msg.contains("server error"))
        );
        assert_eq!(catalog.songs().len(), 3);

        let err = catalog.fetch_popular_songs().await.unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
        assert_eq!(catalog.songs().len(), 3);

        let err = catalog.fetch_popular_songs().await.unwrap_err();
        assert!(
            matches!(err, CatalogError::Network(ref msg) if msg.contains("404") && msg.contains("client error"))
        );
        assert_eq!(catalog.songs().len(), 3);
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn test_fetch_writes_cache_and_seeds_next_instance() {
        let store = Arc::new(MemoryStore::default());
        let first = service(scripted(vec![Ok(ok_response(TWO_SONGS))]), store.clone());
        first.fetch_popular_songs().await.unwrap();
        assert!(store.raw("cachedSongs").is_some());

        // Next launch: the request fails, the cached copy stays visible
        let second = service(
            scripted(vec![Err(BridgeError::OperationFailed("offline".to_string()))]),
            store,
        );
        let mut events = second.events().stream();

        assert!(second.fetch_popular_songs().await.is_err());
        assert_eq!(ids(&second.songs()), vec!["1", "2"]);

        assert_eq!(
            events.recv().await.unwrap(),
            CatalogEvent::LoadingChanged { is_loading: true }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CatalogEvent::SongsReplaced {
                count: 2,
                source: SongsSource::Cache
            }
        );
    }

    #[tokio::test]
    async fn test_cache_disabled() {
        let store = Arc::new(MemoryStore::default());
        let config = CatalogConfig::builder().cache_enabled(false).build().unwrap();
        let catalog = service_with(
            Arc::new(scripted(vec![Ok(ok_response(TWO_SONGS))])),
            store.clone(),
            config,
        );

        catalog.fetch_popular_songs().await.unwrap();
        assert!(store.raw("cachedSongs").is_none());
    }

    #[tokio::test]
    async fn test_cache_write_failure_does_not_fail_fetch() {
        let store = Arc::new(MemoryStore::default());
        store.fail_writes(true);
        let catalog = service(scripted(vec![Ok(ok_response(TWO_SONGS))]), store);

        assert_eq!(
            catalog.fetch_popular_songs().await.unwrap(),
            FetchOutcome::Fetched { count: 2 }
        );
        assert_eq!(catalog.songs().len(), 2);
    }

    #[tokio::test]
    async fn test_non_numeric_views_sort_last() {
        let body = r#"[
            {"id":"1","title":"A","artist":"X","views":"abc"},
            {"id":"2","title":"B","artist":"Y","views":"10"},
            {"id":"3","title":"C","artist":"Z","views":"10"},
            {"id":"4","title":"D","artist":"W"}
        ]"#;
        let catalog = service(
            scripted(vec![Ok(ok_response(body))]),
            Arc::new(MemoryStore::default()),
        );
        catalog.fetch_popular_songs().await.unwrap();

        assert_eq!(ids(&catalog.top_songs()), vec!["2", "3", "1", "4"]);
    }

    #[tokio::test]
    async fn test_top_songs_limit() {
        let body = serde_json::to_string(
            &(0..30)
                .map(|i| Song::new(i.to_string(), "t", "a").with_views(i.to_string()))
                .collect::<Vec<_>>(),
        )
        .unwrap();
        let catalog = service(
            scripted(vec![Ok(ok_response(&body))]),
            Arc::new(MemoryStore::default()),
        );
        catalog.fetch_popular_songs().await.unwrap();

        let top = catalog.top_songs();
        assert_eq!(top.len(), 20);
        assert_eq!(top[0].id(), "29");
        assert!(top.windows(2).all(|w| w[0].view_count() >= w[1].view_count()));
    }

    #[tokio::test]
    async fn test_search() {
        let catalog = service(
            scripted(vec![Ok(ok_response(THREE_SONGS))]),
            Arc::new(MemoryStore::default()),
        );
        catalog.fetch_popular_songs().await.unwrap();

        assert!(catalog.search_songs("").is_empty());
        assert_eq!(ids(&catalog.search_songs("ELLO")), vec!["1", "3"]);
        assert_eq!(ids(&catalog.search_songs("beyon")), vec!["2"]);
        assert_eq!(ids(&catalog.search_results()), vec!["2"]);
        assert!(catalog.search_songs("metallica").is_empty());

        catalog.search_songs("halo");
        catalog.clear_search();
        assert!(catalog.search_results().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_and_reload() {
        let store = Arc::new(MemoryStore::default());
        let catalog = service(scripted(vec![Ok(ok_response(THREE_SONGS))]), store.clone());
        catalog.fetch_popular_songs().await.unwrap();
        let song = catalog.find_song("2").unwrap();

        assert!(catalog.toggle_favorite(&song).await.unwrap());
        assert!(catalog.is_favorite(&song));

        // A fresh instance over the same store sees the toggle
        let fresh = service(MockHttp::new(), store.clone());
        assert_eq!(fresh.load_favorites().await.unwrap(), 1);
        assert!(fresh.is_favorite(&song));

        assert!(!catalog.toggle_favorite(&song).await.unwrap());
        assert!(!catalog.is_favorite(&song));
        assert_eq!(fresh.load_favorites().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_toggle_rolls_back_on_write_failure() {
        let store = Arc::new(MemoryStore::default());
        let catalog = service(MockHttp::new(), store.clone());
        let song = Song::new("9", "T", "A");

        store.fail_writes(true);
        let err = catalog.toggle_favorite(&song).await.unwrap_err();

        assert!(matches!(err, CatalogError::Persistence(_)));
        assert!(!catalog.is_favorite(&song));
        assert!(catalog.favorite_ids().is_empty());
    }

    #[tokio::test]
    async fn test_favorites_ignore_stale_ids() {
        let store = Arc::new(MemoryStore::with_value(
            "favoriteSongs",
            r#"["3","1","gone"]"#,
        ));

        let catalog = service(scripted(vec![Ok(ok_response(THREE_SONGS))]), store);
        assert_eq!(catalog.load_favorites().await.unwrap(), 3);
        catalog.fetch_popular_songs().await.unwrap();

        assert_eq!(ids(&catalog.favorites()), vec!["1", "3"]);
        assert!(catalog.favorite_ids().contains("gone"));
    }

    #[tokio::test]
    async fn test_corrupted_favorites_on_startup() {
        let store = Arc::new(MemoryStore::with_value("favoriteSongs", "not json"));

        let catalog = service(MockHttp::new(), store);
        let err = catalog.load_favorites().await.unwrap_err();

        assert!(matches!(err, CatalogError::Persistence(_)));
        assert!(catalog.favorite_ids().is_empty());
    }

    #[tokio::test]
    async fn test_corrupted_reload_keeps_current_favorites() {
        let store = Arc::new(MemoryStore::default());
        let catalog = service(MockHttp::new(), store.clone());
        let song = Song::new("7", "T", "A");

        assert!(catalog.toggle_favorite(&song).await.unwrap());
        store.set_raw("favoriteSongs", "not json");

        let err = catalog.load_favorites().await.unwrap_err();

        assert!(matches!(err, CatalogError::Persistence(_)));
        assert!(catalog.is_favorite(&song));
        assert_eq!(
            catalog.favorite_ids(),
            BTreeSet::from(["7".to_string()])
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_skip_while_in_flight() {
        let http = Arc::new(GatedHttp::new(vec![TWO_SONGS, TWO_SONGS]));
        let config = CatalogConfig::builder()
            .overlap_policy(FetchOverlapPolicy::SkipWhileInFlight)
            .build()
            .unwrap();
        let catalog = Arc::new(service_with(
            http.clone(),
            Arc::new(MemoryStore::default()),
            config,
        ));

        let first = tokio::spawn({
            let catalog = Arc::clone(&catalog);
            async move { catalog.fetch_popular_songs().await }
        });
        http.wait_for_calls(1).await;
        assert!(catalog.is_loading());

        let second = catalog.fetch_popular_songs().await.unwrap();
        assert_eq!(second, FetchOutcome::Skipped);
        assert_eq!(http.calls(), 1);

        http.open(0);
        let first = first.await.unwrap().unwrap();
        assert_eq!(first, FetchOutcome::Fetched { count: 2 });
        assert!(!catalog.is_loading());

        // Guard released: the next fetch goes out again
        http.open(1);
        catalog.fetch_popular_songs().await.unwrap();
        assert_eq!(http.calls(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_fetches_last_write_wins() {
        let http = Arc::new(GatedHttp::new(vec![TWO_SONGS, THREE_SONGS]));
        let catalog = Arc::new(service_with(
            http.clone(),
            Arc::new(MemoryStore::default()),
            CatalogConfig::default(),
        ));

        let spawn_fetch = || {
            let catalog = Arc::clone(&catalog);
            tokio::spawn(async move { catalog.fetch_popular_songs().await })
        };

        let first = spawn_fetch();
        http.wait_for_calls(1).await;
        let second = spawn_fetch();
        http.wait_for_calls(2).await;

        // The second request completes first; the first one lands last
        http.open(1);
        assert_eq!(
            second.await.unwrap().unwrap(),
            FetchOutcome::Fetched { count: 3 }
        );
        assert_eq!(ids(&catalog.songs()), vec!["1", "2", "3"]);

        http.open(0);
        assert_eq!(
            first.await.unwrap().unwrap(),
            FetchOutcome::Fetched { count: 2 }
        );

        assert_eq!(http.calls(), 2);
        assert_eq!(ids(&catalog.songs()), vec!["1", "2"]);
        assert!(!catalog.is_loading());
    }

    #[tokio::test]
    async fn test_snapshot_and_preview() {
        let catalog = service(
            scripted(vec![Ok(ok_response(TWO_SONGS))]),
            Arc::new(MemoryStore::default()),
        );
        catalog.fetch_popular_songs().await.unwrap();
        catalog.search_songs("a");

        let snapshot = catalog.snapshot();
        assert_eq!(snapshot.songs.len(), 2);
        assert_eq!(ids(&snapshot.search_results), vec!["1"]);
        assert!(!snapshot.is_loading);

        let song = catalog.find_song("1").unwrap();
        assert_eq!(catalog.preview(&song), "la la...");
        assert!(catalog.find_song("404").is_none());
    }
}

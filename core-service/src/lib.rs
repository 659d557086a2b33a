//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (HTTP, settings
//! storage, URL launching) into the catalog core. Desktop apps typically
//! enable the `desktop-shims` feature, which depends on `bridge-desktop`, and
//! call [`bootstrap_desktop`]. Mobile hosts build [`CatalogDependencies`]
//! from their own bridge implementations.
//!
//! ```no_run
//! # #[cfg(feature = "desktop-shims")]
//! # async fn example() -> core_service::Result<()> {
//! use core_runtime::config::CatalogConfig;
//!
//! let config = CatalogConfig::builder().endpoint_from_env().build()?;
//! let core = core_service::bootstrap_desktop(config).await?;
//!
//! core.catalog().fetch_popular_songs().await?;
//! for song in core.catalog().top_songs() {
//!     println!("{} - {}", song.title(), song.artist());
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::sync::Arc;

use bridge_traits::{http::HttpClient, launcher::UrlLauncher, storage::SettingsStore};
use core_catalog::{LinkOpener, OpenedLink, SongCatalogService, StreamingService};
use core_library::models::Song;
use core_library::repositories::{StoreFavoritesRepository, StoreSongCacheRepository};
use core_runtime::config::CatalogConfig;
use core_runtime::events::{EventBus, EventStream};
use tracing::{info, warn};

#[cfg(feature = "desktop-shims")]
use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore, SystemUrlLauncher};

/// Aggregated handle to all bridge dependencies the core requires.
#[derive(Clone)]
pub struct CatalogDependencies {
    pub http_client: Arc<dyn HttpClient>,
    pub settings_store: Arc<dyn SettingsStore>,
    pub url_launcher: Arc<dyn UrlLauncher>,
}

impl CatalogDependencies {
    /// Construct a dependency bundle from explicit bridge handles.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        settings_store: Arc<dyn SettingsStore>,
        url_launcher: Arc<dyn UrlLauncher>,
    ) -> Self {
        Self {
            http_client,
            settings_store,
            url_launcher,
        }
    }
}

/// Primary façade exposed to host applications.
///
/// Cheap to clone; clones share the same catalog state and event bus.
#[derive(Clone)]
pub struct CoreService {
    deps: Arc<CatalogDependencies>,
    config: Arc<CatalogConfig>,
    catalog: Arc<SongCatalogService>,
    links: LinkOpener,
    events: EventBus,
}

impl CoreService {
    /// Create a new service from the provided dependencies.
    ///
    /// Nothing is read from storage until [`start`](Self::start).
    pub fn new(deps: CatalogDependencies, config: CatalogConfig) -> Self {
        let events = EventBus::default();

        let favorites = Arc::new(StoreFavoritesRepository::with_key(
            Arc::clone(&deps.settings_store),
            config.favorites_key.clone(),
        ));
        let cache = Arc::new(StoreSongCacheRepository::with_key(
            Arc::clone(&deps.settings_store),
            config.cache_key.clone(),
        ));

        let catalog = Arc::new(SongCatalogService::new(
            Arc::clone(&deps.http_client),
            favorites,
            cache,
            config.clone(),
            events.clone(),
        ));
        let links = LinkOpener::new(Arc::clone(&deps.url_launcher));

        Self {
            deps: Arc::new(deps),
            config: Arc::new(config),
            catalog,
            links,
            events,
        }
    }

    /// Load persisted favorites.
    ///
    /// Unreadable favorites are logged and the catalog starts with an empty
    /// set. Returns the number of favorites loaded.
    pub async fn start(&self) -> usize {
        match self.catalog.load_favorites().await {
            Ok(count) => {
                info!(favorites = count, "Core service started");
                count
            }
            Err(e) => {
                warn!(error = %e, "Starting without persisted favorites");
                0
            }
        }
    }

    pub fn catalog(&self) -> Arc<SongCatalogService> {
        Arc::clone(&self.catalog)
    }

    /// Open `song` on `service`, falling back to the web URL.
    pub async fn open_link(
        &self,
        song: &Song,
        service: StreamingService,
    ) -> core_catalog::Result<OpenedLink> {
        self.links.open(song, service).await
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to catalog events from this point on.
    pub fn subscribe(&self) -> EventStream {
        self.events.stream()
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Access the bridge dependencies being used by the service.
    pub fn dependencies(&self) -> Arc<CatalogDependencies> {
        Arc::clone(&self.deps)
    }
}

/// Convenience bootstrapper for desktop hosts.
///
/// Wires `ReqwestHttpClient`, `SqliteSettingsStore` (at
/// `config.settings_path`, or the platform data directory) and
/// `SystemUrlLauncher`, then calls [`CoreService::start`].
#[cfg(feature = "desktop-shims")]
pub async fn bootstrap_desktop(config: CatalogConfig) -> Result<CoreService> {
    let http_client = ReqwestHttpClient::with_options(config.request_timeout, &config.user_agent)
        .map_err(|e| core_runtime::Error::capability_missing("HttpClient", e.to_string()))?;

    let settings_store = match &config.settings_path {
        Some(path) => SqliteSettingsStore::new(path.clone()).await,
        None => SqliteSettingsStore::open_default().await,
    }
    .map_err(|e| CoreError::InitializationFailed(format!("Settings store: {}", e)))?;

    let deps = CatalogDependencies::new(
        Arc::new(http_client),
        Arc::new(settings_store),
        Arc::new(SystemUrlLauncher::new()),
    );

    let core = CoreService::new(deps, config);
    core.start().await;
    Ok(core)
}

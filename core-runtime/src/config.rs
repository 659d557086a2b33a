//! # Catalog Configuration Module
//!
//! Provides configuration management for the lyrics catalog core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `CatalogConfig`. Every field has a default, and `build()` validates the
//! result so a bad endpoint or key is reported at startup rather than on the
//! first fetch.
//!
//! ## Usage
//!
//! ```
//! use core_runtime::config::{CatalogConfig, FetchOverlapPolicy};
//!
//! let config = CatalogConfig::builder()
//!     .endpoint_url("https://example.com/songs.json")
//!     .top_songs_limit(10)
//!     .overlap_policy(FetchOverlapPolicy::SkipWhileInFlight)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.top_songs_limit, 10);
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::CatalogConfig;
//!
//! // Fails: the favorites and cache keys must differ
//! let config = CatalogConfig::builder()
//!     .favorites_key("songs")
//!     .cache_key("songs")
//!     .build()
//!     .expect("keys collide");
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Endpoint serving the JSON song list
pub const DEFAULT_ENDPOINT_URL: &str = "https://devlk.com/lyricsv1.php";

/// Environment variable overriding the endpoint
pub const ENDPOINT_ENV_VAR: &str = "LYRICS_CATALOG_URL";

pub use core_library::models::DEFAULT_PREVIEW_LENGTH;
pub use core_library::repositories::{DEFAULT_CACHE_KEY, DEFAULT_FAVORITES_KEY};

pub const DEFAULT_TOP_SONGS_LIMIT: usize = 20;
pub const MAX_TOP_SONGS_LIMIT: usize = 500;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_USER_AGENT: &str = concat!("lyrics-catalog/", env!("CARGO_PKG_VERSION"));

/// What happens when a fetch starts while another one is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOverlapPolicy {
    /// Both fetches run; whichever completes last decides `songs`.
    #[default]
    LastWriteWins,
    /// The later fetch returns immediately without issuing a request.
    SkipWhileInFlight,
}

/// Configuration for the lyrics catalog core.
///
/// Use [`CatalogConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// URL of the song list (plain `GET`, JSON array response)
    pub endpoint_url: String,

    /// Settings key of the favorite id set
    pub favorites_key: String,

    /// Settings key of the cached song list
    pub cache_key: String,

    /// Maximum number of entries returned by `top_songs`
    pub top_songs_limit: usize,

    /// Characters of lyrics shown in list previews
    pub preview_length: usize,

    /// Per-request timeout for the catalog fetch
    pub request_timeout: Duration,

    /// `User-Agent` sent with the catalog fetch
    pub user_agent: String,

    pub overlap_policy: FetchOverlapPolicy,

    /// Whether fetched songs are written to, and seeded from, the cache key
    pub cache_enabled: bool,

    /// SQLite file for the desktop settings store; platform data dir when unset
    pub settings_path: Option<PathBuf>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            endpoint_url: DEFAULT_ENDPOINT_URL.to_string(),
            favorites_key: DEFAULT_FAVORITES_KEY.to_string(),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            top_songs_limit: DEFAULT_TOP_SONGS_LIMIT,
            preview_length: DEFAULT_PREVIEW_LENGTH,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            overlap_policy: FetchOverlapPolicy::default(),
            cache_enabled: true,
            settings_path: None,
        }
    }
}

impl CatalogConfig {
    /// Creates a new builder for constructing a `CatalogConfig`.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The endpoint parses as an `http` or `https` URL
    /// - Storage keys are non-empty and distinct
    /// - The top songs limit is within `1..=500`
    /// - The request timeout is non-zero
    pub fn validate(&self) -> Result<()> {
        let endpoint = Url::parse(&self.endpoint_url).map_err(|e| {
            Error::Config(format!(
                "Invalid endpoint URL '{}': {}",
                self.endpoint_url, e
            ))
        })?;

        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Endpoint URL must use http or https, got '{}'",
                endpoint.scheme()
            )));
        }

        if self.favorites_key.trim().is_empty() {
            return Err(Error::Config("Favorites key cannot be empty".to_string()));
        }

        if self.cache_key.trim().is_empty() {
            return Err(Error::Config("Cache key cannot be empty".to_string()));
        }

        if self.favorites_key == self.cache_key {
            return Err(Error::Config(format!(
                "Favorites key and cache key must differ (both are '{}')",
                self.cache_key
            )));
        }

        if self.top_songs_limit == 0 || self.top_songs_limit > MAX_TOP_SONGS_LIMIT {
            return Err(Error::Config(format!(
                "Top songs limit must be between 1 and {}, got {}",
                MAX_TOP_SONGS_LIMIT, self.top_songs_limit
            )));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::Config(
                "Request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`CatalogConfig`].
#[derive(Debug, Default)]
pub struct CatalogConfigBuilder {
    endpoint_url: Option<String>,
    favorites_key: Option<String>,
    cache_key: Option<String>,
    top_songs_limit: Option<usize>,
    preview_length: Option<usize>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
    overlap_policy: Option<FetchOverlapPolicy>,
    cache_enabled: Option<bool>,
    settings_path: Option<PathBuf>,
}

impl CatalogConfigBuilder {
    /// Sets the catalog endpoint.
    ///
    /// Default: `https://devlk.com/lyricsv1.php`
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Takes the endpoint from `LYRICS_CATALOG_URL` when it is set and non-empty.
    ///
    /// An explicit [`endpoint_url`](Self::endpoint_url) call made afterwards wins.
    pub fn endpoint_from_env(self) -> Self {
        match std::env::var(ENDPOINT_ENV_VAR) {
            Ok(url) if !url.trim().is_empty() => self.endpoint_url(url.trim()),
            _ => self,
        }
    }

    pub fn favorites_key(mut self, key: impl Into<String>) -> Self {
        self.favorites_key = Some(key.into());
        self
    }

    pub fn cache_key(mut self, key: impl Into<String>) -> Self {
        self.cache_key = Some(key.into());
        self
    }

    /// Sets the maximum length of the top songs list.
    ///
    /// Default: 20
    pub fn top_songs_limit(mut self, limit: usize) -> Self {
        self.top_songs_limit = Some(limit);
        self
    }

    pub fn preview_length(mut self, chars: usize) -> Self {
        self.preview_length = Some(chars);
        self
    }

    /// Default: 30 seconds
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn overlap_policy(mut self, policy: FetchOverlapPolicy) -> Self {
        self.overlap_policy = Some(policy);
        self
    }

    /// Enables or disables the song cache.
    ///
    /// Default: enabled
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache_enabled = Some(enabled);
        self
    }

    pub fn settings_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    /// Builds the final `CatalogConfig` instance.
    ///
    /// Unset fields take their defaults; the result is validated with
    /// [`CatalogConfig::validate`].
    pub fn build(self) -> Result<CatalogConfig> {
        let defaults = CatalogConfig::default();

        let config = CatalogConfig {
            endpoint_url: self.endpoint_url.unwrap_or(defaults.endpoint_url),
            favorites_key: self.favorites_key.unwrap_or(defaults.favorites_key),
            cache_key: self.cache_key.unwrap_or(defaults.cache_key),
            top_songs_limit: self.top_songs_limit.unwrap_or(defaults.top_songs_limit),
            preview_length: self.preview_length.unwrap_or(defaults.preview_length),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            user_agent: self.user_agent.unwrap_or(defaults.user_agent),
            overlap_policy: self.overlap_policy.unwrap_or(defaults.overlap_policy),
            cache_enabled: self.cache_enabled.unwrap_or(defaults.cache_enabled),
            settings_path: self.settings_path,
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::builder().build().unwrap();

        assert_eq!(config.endpoint_url, "https://devlk.com/lyricsv1.php");
        assert_eq!(config.favorites_key, "favoriteSongs");
        assert_eq!(config.cache_key, "cachedSongs");
        assert_eq!(config.top_songs_limit, 20);
        assert_eq!(config.preview_length, 100);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.overlap_policy, FetchOverlapPolicy::LastWriteWins);
        assert!(config.cache_enabled);
        assert!(config.settings_path.is_none());
        assert_eq!(config, CatalogConfig::default());
    }

    #[test]
    fn test_builder_overrides() {
        let config = CatalogConfig::builder()
            .endpoint_url("http://localhost:8080/songs")
            .favorites_key("favs")
            .cache_key("songs")
            .top_songs_limit(5)
            .preview_length(40)
            .request_timeout(Duration::from_secs(3))
            .user_agent("test-agent")
            .overlap_policy(FetchOverlapPolicy::SkipWhileInFlight)
            .cache_enabled(false)
            .settings_path("/tmp/settings.db")
            .build()
            .unwrap();

        assert_eq!(config.endpoint_url, "http://localhost:8080/songs");
        assert_eq!(config.favorites_key, "favs");
        assert_eq!(config.top_songs_limit, 5);
        assert_eq!(config.preview_length, 40);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.overlap_policy, FetchOverlapPolicy::SkipWhileInFlight);
        assert!(!config.cache_enabled);
        assert_eq!(config.settings_path, Some(PathBuf::from("/tmp/settings.db")));
    }

    #[test]
    fn test_rejects_malformed_endpoint() {
        let err = CatalogConfig::builder()
            .endpoint_url("not a url")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Invalid endpoint URL"));

        let err = CatalogConfig::builder()
            .endpoint_url("ftp://example.com/songs")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn test_rejects_bad_keys() {
        let err = CatalogConfig::builder()
            .favorites_key("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Favorites key cannot be empty"));

        let err = CatalogConfig::builder().cache_key("").build().unwrap_err();
        assert!(err.to_string().contains("Cache key cannot be empty"));

        let err = CatalogConfig::builder()
            .favorites_key("same")
            .cache_key("same")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn test_top_songs_limit_bounds() {
        assert!(CatalogConfig::builder().top_songs_limit(0).build().is_err());
        assert!(CatalogConfig::builder().top_songs_limit(501).build().is_err());
        assert!(CatalogConfig::builder().top_songs_limit(1).build().is_ok());
        assert!(CatalogConfig::builder().top_songs_limit(500).build().is_ok());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = CatalogConfig::builder()
            .request_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_endpoint_from_env() {
        std::env::set_var(ENDPOINT_ENV_VAR, "https://mirror.example.com/lyrics.json");
        let config = CatalogConfig::builder()
            .endpoint_from_env()
            .build()
            .unwrap();
        std::env::remove_var(ENDPOINT_ENV_VAR);

        assert_eq!(config.endpoint_url, "https://mirror.example.com/lyrics.json");
    }

    #[test]
    fn test_overlap_policy_serde() {
        let json = serde_json::to_string(&FetchOverlapPolicy::SkipWhileInFlight).unwrap();
        assert_eq!(json, "\"skip_while_in_flight\"");
    }
}

//! # Streaming Deep Links
//!
//! Builds "listen on Spotify / YouTube" links for a song and opens the first
//! one the platform can handle, falling back to the service's web search.
//!
//! ```text
//! Spotify: spotify://search/{q}                  -> https://open.spotify.com/search/{q}
//! YouTube: youtu.be://{q}, youtube://{q}         -> https://www.youtube.com/results?search_query={q}
//! ```
//!
//! `{q}` is the percent-encoded `"{title} {artist}"`.

use crate::error::{CatalogError, Result};
use bridge_traits::launcher::UrlLauncher;
use core_library::models::Song;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Streaming service a song can be looked up on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingService {
    Spotify,
    YouTube,
}

impl StreamingService {
    pub const ALL: [StreamingService; 2] = [StreamingService::Spotify, StreamingService::YouTube];

    pub fn display_name(&self) -> &'static str {
        match self {
            StreamingService::Spotify => "Spotify",
            StreamingService::YouTube => "YouTube",
        }
    }
}

impl fmt::Display for StreamingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// App URLs to try in order, plus the web URL used when none can be opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeepLink {
    pub service: StreamingService,
    pub app_urls: Vec<String>,
    pub web_url: String,
}

impl DeepLink {
    pub fn for_song(service: StreamingService, song: &Song) -> Self {
        let query = urlencoding::encode(&song.search_query()).into_owned();

        match service {
            StreamingService::Spotify => Self {
                service,
                app_urls: vec![format!("spotify://search/{}", query)],
                web_url: format!("https://open.spotify.com/search/{}", query),
            },
            StreamingService::YouTube => Self {
                service,
                app_urls: vec![
                    format!("youtu.be://{}", query),
                    format!("youtube://{}", query),
                ],
                web_url: format!("https://www.youtube.com/results?search_query={}", query),
            },
        }
    }
}

/// Which URL [`LinkOpener::open`] ended up opening
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedLink {
    pub service: StreamingService,
    pub url: String,
    /// `true` when no app URL could be opened and the web URL was used
    pub used_fallback: bool,
}

/// Opens [`DeepLink`]s through the host's [`UrlLauncher`]
#[derive(Clone)]
pub struct LinkOpener {
    launcher: Arc<dyn UrlLauncher>,
}

impl LinkOpener {
    pub fn new(launcher: Arc<dyn UrlLauncher>) -> Self {
        Self { launcher }
    }

    /// Open `song` on `service`.
    ///
    /// App URLs are tried in order, skipping those `can_open` rejects or that
    /// fail to open. The web URL is opened without a `can_open` check.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::LinkUnavailable`] if the web URL fails too.
    pub async fn open(&self, song: &Song, service: StreamingService) -> Result<OpenedLink> {
        let link = DeepLink::for_song(service, song);

        for url in &link.app_urls {
            if !self.launcher.can_open(url).await {
                debug!(service = %service, url = %url, "App link not supported");
                continue;
            }

            match self.launcher.open(url).await {
                Ok(()) => {
                    info!(service = %service, song_id = song.id(), "Opened app link");
                    return Ok(OpenedLink {
                        service,
                        url: url.clone(),
                        used_fallback: false,
                    });
                }
                Err(e) => {
                    warn!(service = %service, url = %url, error = %e, "Failed to open app link");
                }
            }
        }

        self.launcher.open(&link.web_url).await.map_err(|e| {
            warn!(service = %service, error = %e, "Failed to open web link");
            CatalogError::LinkUnavailable(format!("{} link for '{}': {}", service, song.id(), e))
        })?;

        info!(service = %service, song_id = song.id(), "Opened web link");
        Ok(OpenedLink {
            service,
            url: link.web_url,
            used_fallback: true,
        })
    }
}

//! # Event Bus System
//!
//! Broadcasts catalog state changes to host applications using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **`CatalogEvent`**: What changed in the catalog (loading flag, songs, favorites, search)
//! - **`EventBus`**: Central broadcast channel the catalog service publishes to
//! - **`EventStream`**: Receiver wrapper with optional filtering
//!
//! ```text
//! ┌──────────────────┐   emit   ┌──────────┐  subscribe  ┌──────────────┐
//! │ SongCatalogService├────────>│ EventBus ├────────────>│ Host UI / CLI│
//! └──────────────────┘          └──────────┘             └──────────────┘
//! ```
//!
//! Events only announce changes; the current values are always read back
//! from the service itself.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CatalogEvent, EventBus, EventStream};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(32);
//! let mut favorites = EventStream::new(event_bus.subscribe())
//!     .filter(|event| matches!(event, CatalogEvent::FavoriteToggled { .. }));
//!
//! event_bus.emit(CatalogEvent::LoadingChanged { is_loading: true }).ok();
//! event_bus
//!     .emit(CatalogEvent::FavoriteToggled {
//!         song_id: "42".to_string(),
//!         is_favorite: true,
//!         total: 1,
//!     })
//!     .ok();
//!
//! let event = favorites.recv().await.unwrap();
//! assert_eq!(event.description(), "Favorite toggled");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber missed `n` events. Non-fatal;
//!   re-read state from the service and keep receiving.
//! - **`RecvError::Closed`**: the bus was dropped. Treat as shutdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Catalog Events
// ============================================================================

/// Where a replacement song list came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SongsSource {
    Network,
    Cache,
}

/// Changes published by the catalog service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CatalogEvent {
    /// A fetch started or finished.
    LoadingChanged { is_loading: bool },
    /// `songs` was replaced wholesale.
    SongsReplaced { count: usize, source: SongsSource },
    /// A fetch failed; `songs` is unchanged.
    FetchFailed { reason: String },
    /// A song entered or left the favorite set.
    FavoriteToggled {
        song_id: String,
        is_favorite: bool,
        /// Size of the favorite set after the toggle.
        total: usize,
    },
    /// The persisted favorite set was loaded.
    FavoritesLoaded { count: usize },
    /// `search_results` was recomputed.
    SearchUpdated { query: String, result_count: usize },
}

impl CatalogEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CatalogEvent::LoadingChanged { is_loading: true } => "Loading started",
            CatalogEvent::LoadingChanged { is_loading: false } => "Loading finished",
            CatalogEvent::SongsReplaced { .. } => "Songs replaced",
            CatalogEvent::FetchFailed { .. } => "Fetch failed",
            CatalogEvent::FavoriteToggled { .. } => "Favorite toggled",
            CatalogEvent::FavoritesLoaded { .. } => "Favorites loaded",
            CatalogEvent::SearchUpdated { .. } => "Search updated",
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CatalogEvent::FetchFailed { .. } => EventSeverity::Warning,
            CatalogEvent::SongsReplaced { .. } | CatalogEvent::FavoritesLoaded { .. } => {
                EventSeverity::Info
            }
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to catalog events.
///
/// Cloning the bus shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CatalogEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// A subscriber that falls behind by more than `capacity` events receives
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none. Publishers that don't care about delivery call
    /// `.ok()` on the result.
    pub fn emit(&self, event: CatalogEvent) -> Result<usize, SendError<CatalogEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CatalogEvent> {
        self.sender.subscribe()
    }

    /// Subscribes and wraps the receiver in an [`EventStream`].
    pub fn stream(&self) -> EventStream {
        EventStream::new(self.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CatalogEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
pub struct EventStream {
    receiver: Receiver<CatalogEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CatalogEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`/`try_recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CatalogEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Only events at or above `min` severity pass.
    pub fn min_severity(self, min: EventSeverity) -> Self {
        self.filter(move |event| event.severity() >= min)
    }

    fn accepts(&self, event: &CatalogEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receives the next event that passes the filter.
    ///
    /// # Errors
    ///
    /// Returns `RecvError::Lagged(n)` if the subscriber fell behind by `n` events.
    /// Returns `RecvError::Closed` if all senders have been dropped.
    pub async fn recv(&mut self) -> Result<CatalogEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.accepts(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CatalogEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.accepts(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

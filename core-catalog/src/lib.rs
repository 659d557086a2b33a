//! # Song Catalog
//!
//! The catalog view model and streaming deep links.
//!
//! ## Overview
//!
//! - [`SongCatalogService`]: fetches the song list, keeps favorites, derives
//!   top songs, favorites and search results
//! - [`links`]: Spotify/YouTube deep links with web fallbacks
//!
//! Both depend only on host capabilities from `bridge-traits`, so hosts
//! inject their own HTTP client, settings store and URL launcher.

pub mod catalog;
pub mod error;
pub mod links;

pub use catalog::{CatalogSnapshot, FetchOutcome, SongCatalogService};
pub use error::{CatalogError, Result};
pub use links::{DeepLink, LinkOpener, OpenedLink, StreamingService};

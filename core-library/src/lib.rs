//! # Song Library Module
//!
//! Owns the song model and the key-value persistence of the user's favorites
//! and of the last fetched catalog.
//!
//! ## Overview
//!
//! This module manages:
//! - The [`Song`](models::Song) record decoded from the catalog endpoint
//! - [`FavoritesRepository`](repositories::FavoritesRepository): the persisted favorite id set
//! - [`SongCacheRepository`](repositories::SongCacheRepository): a single-generation copy of the catalog
//!
//! Both repositories are layered on [`SettingsStore`](bridge_traits::storage::SettingsStore)
//! and store JSON strings.

pub mod error;
pub mod models;
pub mod repositories;

pub use error::{LibraryError, Result};
pub use models::Song;
pub use repositories::{
    FavoritesRepository, SongCacheRepository, StoreFavoritesRepository, StoreSongCacheRepository,
};

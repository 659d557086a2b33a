//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! the lyrics catalog needs:
//! - `HttpClient` using `reqwest`
//! - `SettingsStore` using a SQLite-backed key-value table
//! - `UrlLauncher` using the OS default URL handler
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteSettingsStore, SystemUrlLauncher};
//!
//! #[tokio::main]
//! async fn main() -> bridge_traits::error::Result<()> {
//!     let http_client = ReqwestHttpClient::new()?;
//!     let settings = SqliteSettingsStore::open_default().await?;
//!     let launcher = SystemUrlLauncher::with_schemes(["spotify"]);
//!
//!     // Hand these to core_service::CatalogDependencies
//!     Ok(())
//! }
//! ```

mod http;
mod launcher;
mod settings;

pub use http::ReqwestHttpClient;
pub use launcher::SystemUrlLauncher;
pub use settings::SqliteSettingsStore;

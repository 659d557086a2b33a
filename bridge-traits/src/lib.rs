//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the lyrics catalog core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Async HTTP GET-and-read of the song endpoint
//!
//! ### Storage
//! - [`SettingsStore`](storage::SettingsStore) - Key-value preferences storage
//!   (favorites and the song cache live here)
//!
//! ### Platform Integration
//! - [`UrlLauncher`](launcher::UrlLauncher) - Open app schemes and web URLs
//!
//! ### Utilities
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Available |
//! | iOS      | host-injected       | 📋 Planned |
//! | Android  | host-injected       | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert their native errors to `BridgeError` and
//! include enough context (status code, key, URL) to act on the message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single handle can be shared
//! across async tasks behind an `Arc`.
//!
//! ## Examples
//!
//! ### Implementing SettingsStore
//!
//! ```ignore
//! use bridge_traits::storage::SettingsStore;
//! use bridge_traits::error::Result;
//! use async_trait::async_trait;
//!
//! pub struct UserDefaultsStore;
//!
//! #[async_trait]
//! impl SettingsStore for UserDefaultsStore {
//!     async fn set_string(&self, key: &str, value: &str) -> Result<()> {
//!         // Forward to the platform preferences API
//!         todo!()
//!     }
//!     // ...
//! }
//! ```

pub mod error;
pub mod http;
pub mod launcher;
pub mod logger;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
pub use launcher::UrlLauncher;
pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use storage::SettingsStore;

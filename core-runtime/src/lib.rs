//! # Core Runtime Module
//!
//! Provides the runtime infrastructure shared by the catalog crates:
//! - Logging and tracing setup
//! - Catalog configuration
//! - Event bus for catalog state changes
//!
//! ## Overview
//!
//! Nothing in this crate knows about songs beyond event payloads. It
//! establishes the logging conventions, configuration validation and event
//! broadcasting used throughout the workspace.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CatalogConfig, CatalogConfigBuilder, FetchOverlapPolicy};
pub use error::{Error, Result};
pub use events::{CatalogEvent, EventBus, EventStream, SongsSource};

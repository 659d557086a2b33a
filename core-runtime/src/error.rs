use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration, reported by `build()` before anything runs
    #[error("Configuration error: {0}")]
    Config(String),

    /// A host capability (HTTP client, settings store, URL launcher) could not be provided
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn capability_missing(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CapabilityMissing {
            capability: capability.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

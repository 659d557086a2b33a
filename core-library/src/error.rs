use bridge_traits::error::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Serialization failed ({context}): {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Stored value under '{key}' is corrupted: {reason}")]
    Corrupted { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, LibraryError>;

use core_library::error::LibraryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Endpoint unreachable, timed out or answered with a non-2xx status
    #[error("Network failure: {0}")]
    Network(String),

    /// Response body is not a JSON array of songs
    #[error("Decode failure: {0}")]
    Decode(String),

    /// Favorites or cache could not be read or written
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Link unavailable: {0}")]
    LinkUnavailable(String),
}

impl From<LibraryError> for CatalogError {
    fn from(err: LibraryError) -> Self {
        CatalogError::Persistence(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;

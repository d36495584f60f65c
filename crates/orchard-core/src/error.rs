//! Error types for orchard-core

use thiserror::Error;

/// Result type alias for orchard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the orchard service
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid HTTP method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Route registration conflict
    #[error("Route error: {0}")]
    Route(#[from] orchard_router::RouteError),

    /// Path id that is not a positive integer
    #[error("Invalid record id: {0:?}")]
    InvalidRecordId(String),

    /// Request body that cannot be used as a record
    #[error("Invalid body: {0}")]
    InvalidBody(String),

    /// Body too large
    #[error("Body too large: {size} bytes exceeds limit of {limit} bytes")]
    BodyTooLarge { size: usize, limit: usize },

    /// Seed fixture could not be loaded
    #[error("Invalid fixture: {0}")]
    Fixture(#[source] serde_json::Error),

    /// Response body could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// IO error (native only)
    #[cfg(feature = "native")]
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Hyper error (native only)
    #[cfg(feature = "native")]
    #[error("HTTP error: {0}")]
    Hyper(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

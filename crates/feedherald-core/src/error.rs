//! Error types for feedherald
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for feedherald operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for feedherald
#[derive(Error, Debug)]
pub enum Error {
    /// The history store could not be opened or created
    ///
    /// Fatal: without durable history every restart would re-announce
    /// every item in the feed.
    #[error("History store unavailable: {0}")]
    StorageUnavailable(String),

    /// A single history read or write failed during steady state
    #[error("History store I/O error: {0}")]
    StorageIo(String),

    /// The feed could not be fetched or parsed
    #[error("Feed source error: {0}")]
    FeedSource(String),

    /// The notifier reported a failed delivery
    #[error("Notify failed: {0}")]
    Notify(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a storage-unavailable error
    pub fn storage_unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    /// Create a storage I/O error
    pub fn storage_io(msg: impl Into<String>) -> Self {
        Self::StorageIo(msg.into())
    }

    /// Create a feed source error
    pub fn feed_source(msg: impl Into<String>) -> Self {
        Self::FeedSource(msg.into())
    }

    /// Create a notify error
    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Whether the process must stop rather than carry on to the next cycle
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_) | Self::Config(_))
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

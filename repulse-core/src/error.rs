//! Error types for repulse-core

use crate::traffic::ResourceKind;
use thiserror::Error;

/// Main error type for the repulse-core library
///
/// Every variant except [`Error::Report`] aborts a collection run.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing credentials or invalid settings
    #[error("configuration error: {0}")]
    Config(String),

    /// Network failure or timeout before a response arrived
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// The API answered with a non-success status
    #[error("request to {url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("failed to decode {kind} response: {source}")]
    Decode {
        kind: ResourceKind,
        source: serde_json::Error,
    },

    /// Pagination never produced an empty page
    #[error("{kind} pagination exceeded {limit} pages")]
    PageLimit { kind: ResourceKind, limit: u32 },

    /// Creating the traffic table failed
    #[error("schema error: {0}")]
    Schema(#[source] rusqlite::Error),

    /// Statement prepare or execute failed
    #[error("database error: {0}")]
    Persist(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// External report generation failed
    #[error("report error: {0}")]
    Report(String),
}

/// Result type alias for repulse-core
pub type Result<T> = std::result::Result<T, Error>;

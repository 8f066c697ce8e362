//! Error types for ordervox

use thiserror::Error;

/// Result type alias for ordervox operations
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong between an audio clip and an order
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing configuration
    #[error("config: {0}")]
    Config(String),

    /// Transcription call failed
    #[error("transcription: {0}")]
    Stt(String),

    /// Order extraction failed or returned malformed output
    #[error("order extraction: {0}")]
    Extract(String),

    /// Embedding call failed
    #[error("embedding: {0}")]
    Embedding(String),

    /// Catalog index failure
    #[error("catalog index: {0}")]
    Index(String),

    /// Upstream catalog sync failure
    #[error("catalog sync: {0}")]
    Sync(String),

    /// Filesystem failure
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Outbound HTTP failure
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encode/decode failure
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    /// `SQLite` failure
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool failure
    #[error("db pool: {0}")]
    Pool(#[from] r2d2::Error),
}

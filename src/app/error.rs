use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NovelRankError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Provider {source_id} failed: {message}")]
    Provider { source_id: String, message: String },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure of a refresh that several callers were awaiting together.
    #[error("{0}")]
    Refresh(Arc<NovelRankError>),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, NovelRankError>;

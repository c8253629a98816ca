//! Error types for Kurs.

use thiserror::Error;

/// Library-level error type for Kurs operations.
#[derive(Error, Debug)]
pub enum KursError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Course name could not be resolved, or the index query failed.
    #[error("{0}")]
    Retrieval(String),

    /// The language model call itself failed. Fatal for the request.
    #[error("Model transport error: {0}")]
    ModelTransport(String),

    #[error("Tool '{0}' not found")]
    ToolNotFound(String),

    #[error("{0}")]
    ToolExecution(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Ingest error: {0}")]
    Ingest(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type alias for Kurs operations.
pub type Result<T> = std::result::Result<T, KursError>;

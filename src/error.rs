//! Error types for the wikiseek library.
//!
//! All fallible operations return [`Result`], whose error type is
//! [`WikiseekError`]. Indexing anomalies that only affect a single page are not
//! errors: they are counted in the indexing statistics and the page is skipped.
//! The variants here are the conditions a caller has to react to.
//!
//! # Examples
//!
//! ```
//! use wikiseek::error::{Result, WikiseekError};
//!
//! fn check_capacity(capacity: usize) -> Result<()> {
//!     if capacity == 0 {
//!         return Err(WikiseekError::config("chunk capacity must be positive"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_capacity(0).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for wikiseek operations.
#[derive(Error, Debug)]
pub enum WikiseekError {
    /// I/O errors (file operations, pipes, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The dump violates the expected XML format. Indexing aborts.
    #[error("Malformed dump: {0}")]
    Dump(String),

    /// Index file related errors (ordering, unreadable index).
    #[error("Index error: {0}")]
    Index(String),

    /// Storage backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid settings
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A chunk file is missing or cannot be read.
    #[error("Chunk {chunk_id} unavailable: {reason}")]
    ChunkUnavailable { chunk_id: u64, reason: String },

    /// A chunk was read successfully but does not hold the article.
    #[error("Article {article_id} not present in chunk {chunk_id}")]
    ArticleNotFound { chunk_id: u64, article_id: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with WikiseekError.
pub type Result<T> = std::result::Result<T, WikiseekError>;

impl WikiseekError {
    /// Create a new malformed dump error.
    pub fn dump<S: Into<String>>(msg: S) -> Self {
        WikiseekError::Dump(msg.into())
    }

    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        WikiseekError::Index(msg.into())
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        WikiseekError::Storage(msg.into())
    }

    /// Create a new invalid config error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        WikiseekError::Config(msg.into())
    }

    /// Create a new chunk unavailable error.
    pub fn chunk_unavailable<S: Into<String>>(chunk_id: u64, reason: S) -> Self {
        WikiseekError::ChunkUnavailable {
            chunk_id,
            reason: reason.into(),
        }
    }

    /// Create a new article not found error.
    pub fn article_not_found<S: Into<String>>(chunk_id: u64, article_id: S) -> Self {
        WikiseekError::ArticleNotFound {
            chunk_id,
            article_id: article_id.into(),
        }
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        WikiseekError::Other(msg.into())
    }
}

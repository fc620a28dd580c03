//! Error types for the `advisor-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building or querying a summary index.
#[derive(Debug, Error)]
pub enum RagError {
    /// The corpus could not be turned into a usable index.
    ///
    /// This is fatal for the owning process: an index is never built empty.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// The query was empty or otherwise unusable.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading or writing a corpus file failed.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A corpus file did not contain valid JSON.
    #[error("JSON error in '{}': {source}", path.display())]
    Json {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;

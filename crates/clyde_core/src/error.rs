//! Error types for the clyde core library.

use thiserror::Error;

/// Errors from loading and saving persisted core state.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Outcome of reading a fact store.
#[derive(Error, Debug)]
pub enum FactError {
    /// The store is missing, unreadable or has no non-blank lines.
    #[error("No data in fact store: {0}")]
    NoData(String),

    /// Appending to the store failed.
    #[error("Fact store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CoreError>;

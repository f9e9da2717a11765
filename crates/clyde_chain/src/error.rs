//! Error types for chain persistence.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChainError {
    /// A loaded chain holds keys longer than the configured prefix length.
    #[error("Prefix mismatch: key {key:?} has {found} words but prefix length is {expected}")]
    PrefixMismatch {
        key: String,
        found: usize,
        expected: usize,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChainError>;

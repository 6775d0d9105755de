//! Error types for the kindred core library.

use thiserror::Error;

use crate::types::MemoryId;

/// Top-level error type for all kindred core operations.
#[derive(Error, Debug)]
pub enum KindredError {
    /// The decision engine was asked to resolve an empty vote set.
    #[error("Cannot resolve an empty vote set: at least one vote is required")]
    EmptyVotes,

    /// A memory with the given ID was not found.
    #[error("Memory not found: {0}")]
    MemoryNotFound(MemoryId),

    /// Serialization or deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration could not be parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration parsed but holds an unusable value.
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The memory store rejected or failed an operation.
    #[error("Memory store error: {0}")]
    Store(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for KindredError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, KindredError>;

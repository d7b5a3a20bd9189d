//! Error types for the document cache
//!
//! The public cache surface never returns these. They exist so the disk
//! tier can report typed failures up to the coordinator, which logs and
//! swallows them.

use thiserror::Error;

/// Disk tier error type
#[derive(Debug, Error)]
pub enum CacheError {
    /// IO error while reading, writing or deleting a cache file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Cache file exists but could not be parsed
    #[error("Malformed cache file: {0}")]
    Malformed(String),
}

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Result type alias for disk tier operations
pub type Result<T> = std::result::Result<T, CacheError>;

//! Error types for archive loading and partitioning.

use std::path::PathBuf;

use thiserror::Error;

/// Archive subsystem error type.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A source file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// A source file is not valid JSON and could not be salvaged.
    #[error("unrecoverable JSON in {path}: {source}")]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Original parse failure.
        source: serde_json::Error,
    },
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

//! Configuration for the explorer server and the chunk partitioner.
//!
//! Every value has a documented default and can be overridden through an
//! `EXPLORER_*` environment variable. Unparseable values fall back to the
//! default rather than aborting startup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::archive::error::{ArchiveError, ArchiveResult};

/// Default directory holding the exported `conversations N.json` files.
pub const DEFAULT_DATA_DIR: &str = "data";
/// Default number of numbered source files probed.
pub const DEFAULT_SOURCE_COUNT: usize = 4;
/// Default server port.
pub const DEFAULT_PORT: u16 = 8888;
/// Default directory for static fallback files.
pub const DEFAULT_STATIC_DIR: &str = ".";
/// Default partitioner output directory.
pub const DEFAULT_OUTPUT_DIR: &str = "data/chunks";
/// Default chunk threshold: 45 MiB, under common 50 MB hosting limits.
pub const DEFAULT_MAX_CHUNK_BYTES: u64 = 45 * 1024 * 1024;

/// Where the archive sources live.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// Directory containing the numbered source files.
    pub data_dir: PathBuf,
    /// Number of numbered files to probe (`conversations 1.json` ..= N).
    pub source_count: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            source_count: DEFAULT_SOURCE_COUNT,
        }
    }
}

impl ArchiveConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `EXPLORER_DATA_DIR` and `EXPLORER_SOURCE_COUNT`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: env_path("EXPLORER_DATA_DIR").unwrap_or(defaults.data_dir),
            source_count: env_parse("EXPLORER_SOURCE_COUNT").unwrap_or(defaults.source_count),
        }
    }

    /// Set the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set how many numbered source files are probed.
    #[must_use]
    pub const fn with_source_count(mut self, count: usize) -> Self {
        self.source_count = count;
        self
    }

    /// Ordered list of candidate source paths. Later files win on duplicate ids.
    #[must_use]
    pub fn source_paths(&self) -> Vec<PathBuf> {
        (1..=self.source_count)
            .map(|i| source_file_path(&self.data_dir, i))
            .collect()
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if no source file would be probed.
    pub fn validate(&self) -> ArchiveResult<()> {
        if self.source_count == 0 {
            return Err(ArchiveError::InvalidConfig(
                "source_count must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port.
    pub port: u16,
    /// Directory served for paths outside the API.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig {
    /// Build from `EXPLORER_PORT` and `EXPLORER_STATIC_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("EXPLORER_PORT").unwrap_or(defaults.port),
            static_dir: env_path("EXPLORER_STATIC_DIR").unwrap_or(defaults.static_dir),
        }
    }

    /// Set the listening port.
    #[must_use]
    pub const fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the port is zero.
    pub fn validate(&self) -> ArchiveResult<()> {
        if self.port == 0 {
            return Err(ArchiveError::InvalidConfig("port must be > 0".to_string()));
        }
        Ok(())
    }
}

/// Chunk partitioner settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Directory receiving chunk files and the manifest.
    pub output_dir: PathBuf,
    /// Upper bound on the serialized size of a multi-record chunk.
    pub max_chunk_bytes: u64,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            max_chunk_bytes: DEFAULT_MAX_CHUNK_BYTES,
        }
    }
}

impl PartitionConfig {
    /// Build from `EXPLORER_OUTPUT_DIR` and `EXPLORER_MAX_CHUNK_BYTES`.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: env_path("EXPLORER_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            max_chunk_bytes: env_parse("EXPLORER_MAX_CHUNK_BYTES")
                .unwrap_or(defaults.max_chunk_bytes),
        }
    }

    /// Set the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the chunk size threshold in bytes.
    #[must_use]
    pub const fn with_max_chunk_bytes(mut self, bytes: u64) -> Self {
        self.max_chunk_bytes = bytes;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the threshold is zero.
    pub fn validate(&self) -> ArchiveResult<()> {
        if self.max_chunk_bytes == 0 {
            return Err(ArchiveError::InvalidConfig(
                "max_chunk_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Path of the `index`-th numbered export file (1-based).
#[must_use]
pub fn source_file_path(data_dir: &Path, index: usize) -> PathBuf {
    data_dir.join(format!("conversations {index}.json"))
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

//! Manifest describing a partition run.

use serde::{Deserialize, Serialize};

/// Bytes per megabyte as reported in the manifest.
const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Top-level `manifest.json` document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Records across all chunks, duplicates included.
    pub total_conversations: usize,
    /// Chunks in file order.
    pub chunks: Vec<ChunkEntry>,
}

/// One written chunk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkEntry {
    /// File name relative to the output directory.
    pub file: String,
    /// Records in the chunk.
    pub count: usize,
    /// On-disk size in megabytes, one decimal.
    pub size_mb: f64,
}

impl ChunkEntry {
    /// Describe a chunk from its written byte size.
    #[must_use]
    pub fn new(file: impl Into<String>, count: usize, size_bytes: u64) -> Self {
        Self {
            file: file.into(),
            count,
            size_mb: round_to_tenth(bytes_to_mb(size_bytes)),
        }
    }
}

impl Manifest {
    /// Sum of the reported chunk sizes.
    #[must_use]
    pub fn total_size_mb(&self) -> f64 {
        self.chunks.iter().map(|c| c.size_mb).sum()
    }
}

/// Chunk file name for the 1-based `index`.
#[must_use]
pub fn chunk_file_name(index: usize) -> String {
    format!("conversations_{index:02}.json")
}

#[allow(clippy::cast_precision_loss)] // Chunk sizes are far below 2^52 bytes
fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

fn round_to_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

//! Recovering JSON loader for exported archive files.
//!
//! Each source is either a JSON array of conversation objects or a single
//! object. Failures are isolated per file: a missing file is skipped, an
//! unreadable or unrecoverable file is reported and dropped, and loading always
//! continues with the remaining sources.

use std::path::{Path, PathBuf};

use serde_json::Value;

use super::error::{ArchiveError, ArchiveResult};

/// What happened to one source file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FileStatus {
    /// Parsed cleanly.
    Loaded {
        /// Records contributed.
        count: usize,
    },
    /// Parsed only after dropping a truncated tail.
    Recovered {
        /// Records contributed.
        count: usize,
    },
    /// The file does not exist.
    Missing,
    /// The file was skipped.
    Failed {
        /// Human-readable cause.
        reason: String,
    },
}

/// Per-file entry of a [`LoadOutcome`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileReport {
    /// Source path.
    pub path: PathBuf,
    /// Result for this path.
    pub status: FileStatus,
}

/// Records loaded from a set of sources, in source order.
#[derive(Clone, Debug, Default)]
pub struct LoadOutcome {
    /// Flat record sequence, still untyped.
    pub records: Vec<Value>,
    /// One report per probed path.
    pub reports: Vec<FileReport>,
}

/// Load every path in order, concatenating their records.
pub fn load_sources<P: AsRef<Path>>(paths: &[P]) -> LoadOutcome {
    let mut outcome = LoadOutcome::default();

    for path in paths {
        let path = path.as_ref();
        let status = match load_file(path) {
            Ok(None) => FileStatus::Missing,
            Ok(Some(document)) => {
                let count = document.records.len();
                outcome.records.extend(document.records);
                if document.recovered {
                    tracing::info!("Recovered {count} conversations from {}", path.display());
                    FileStatus::Recovered { count }
                } else {
                    tracing::info!("Loaded {count} conversations from {}", path.display());
                    FileStatus::Loaded { count }
                }
            }
            Err(e) => {
                tracing::warn!("Skipping {}: {e}", path.display());
                FileStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };
        outcome.reports.push(FileReport {
            path: path.to_path_buf(),
            status,
        });
    }

    outcome
}

/// Records parsed out of one document.
#[derive(Debug)]
struct ParsedDocument {
    records: Vec<Value>,
    recovered: bool,
}

/// Read and parse one file. `Ok(None)` means the file does not exist.
fn load_file(path: &Path) -> ArchiveResult<Option<ParsedDocument>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ArchiveError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    tracing::debug!("Parsing {} ({} bytes)", path.display(), content.len());
    parse_document(path, &content).map(Some)
}

fn parse_document(path: &Path, content: &str) -> ArchiveResult<ParsedDocument> {
    match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(records)) => Ok(ParsedDocument {
            records,
            recovered: false,
        }),
        Ok(single) => Ok(ParsedDocument {
            records: vec![single],
            recovered: false,
        }),
        Err(source) => {
            tracing::warn!("JSON error in {}: {source}", path.display());
            salvage_truncated_array(content)
                .map(|records| ParsedDocument {
                    records,
                    recovered: true,
                })
                .ok_or_else(|| ArchiveError::Parse {
                    path: path.to_path_buf(),
                    source,
                })
        }
    }
}

/// Best-effort recovery for an array of objects cut off mid-object.
///
/// Only applies when the trimmed content starts with `[`. The content is cut
/// right after the last `},`, closed with `]`, and parsed again. A single
/// backward scan is made, so at most one truncation point is repaired, and a
/// `},` inside a nested object or a string will usually yield invalid JSON and
/// `None`. This is not a general JSON repair.
#[must_use]
pub fn salvage_truncated_array(content: &str) -> Option<Vec<Value>> {
    let trimmed = content.trim();
    if !trimmed.starts_with('[') {
        return None;
    }

    let cut = trimmed.rfind("},")?;
    let mut repaired = String::with_capacity(cut + 2);
    repaired.push_str(&trimmed[..=cut]);
    repaired.push(']');

    serde_json::from_str(&repaired).ok()
}

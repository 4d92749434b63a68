//! Offline repartitioning of archive exports into size-bounded chunks.
//!
//! The partitioner reads the same numbered sources as the server, keeps every
//! record (no dedup by id), orders them newest first and writes compact chunk
//! files plus a `manifest.json` into the output directory.

pub mod manifest;
pub mod packer;

pub use manifest::{ChunkEntry, Manifest, chunk_file_name};
pub use packer::pack_by_size;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::process::ExitCode;

use serde_json::Value;

use crate::archive::error::ArchiveResult;
use crate::archive::loader::load_sources;
use crate::config::{ArchiveConfig, PartitionConfig};
use crate::start_explorer::init_tracing;

/// Name of the manifest written next to the chunks.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Entry point of the `explorer-split` binary.
///
/// # Returns
/// `ExitCode::SUCCESS` once the manifest is written, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    init_tracing();

    let archive = ArchiveConfig::from_env();
    let config = PartitionConfig::from_env();
    if let Err(e) = archive.validate().and_then(|()| config.validate()) {
        tracing::error!("{e}");
        return ExitCode::from(1);
    }

    match split_archive(&archive, &config) {
        Ok(manifest) => {
            tracing::info!(
                "Manifest written to {}",
                config.output_dir.join(MANIFEST_FILE).display()
            );
            tracing::info!("Total size: {:.1}MB", manifest.total_size_mb());
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Partitioning failed: {e}");
            ExitCode::from(1)
        }
    }
}

/// Load every source of `archive` and write its chunks per `config`.
///
/// # Errors
/// Returns an error if the output directory, a chunk or the manifest cannot
/// be written. Unreadable sources are skipped, not reported as errors.
pub fn split_archive(archive: &ArchiveConfig, config: &PartitionConfig) -> ArchiveResult<Manifest> {
    let outcome = load_sources(&archive.source_paths());
    tracing::info!("Total: {} conversations", outcome.records.len());
    write_chunks(outcome.records, config)
}

/// Sort records newest first, pack them and write chunks and manifest.
///
/// # Errors
/// Returns an error if serialization or any filesystem write fails.
pub fn write_chunks(mut records: Vec<Value>, config: &PartitionConfig) -> ArchiveResult<Manifest> {
    fs::create_dir_all(&config.output_dir)?;

    records.sort_by(|a, b| created_at(b).cmp(created_at(a)));
    let total_conversations = records.len();

    let encoded = records
        .iter()
        .map(|record| -> ArchiveResult<(Vec<u8>, u64)> {
            let bytes = serde_json::to_vec(record)?;
            let size = bytes.len() as u64;
            Ok((bytes, size))
        })
        .collect::<ArchiveResult<Vec<_>>>()?;
    drop(records);

    let chunks = pack_by_size(encoded, config.max_chunk_bytes);
    tracing::info!("Split into {} chunks", chunks.len());

    let mut manifest = Manifest {
        total_conversations,
        chunks: Vec::with_capacity(chunks.len()),
    };

    for (i, chunk) in chunks.iter().enumerate() {
        let file = chunk_file_name(i + 1);
        let size_bytes = write_chunk(&config.output_dir.join(&file), chunk)?;
        let entry = ChunkEntry::new(file, chunk.len(), size_bytes);
        tracing::info!("{}: {} conversations, {:.1}MB", entry.file, entry.count, entry.size_mb);
        manifest.chunks.push(entry);
    }

    let mut writer = BufWriter::new(File::create(config.output_dir.join(MANIFEST_FILE))?);
    serde_json::to_writer_pretty(&mut writer, &manifest)?;
    writer.flush()?;

    Ok(manifest)
}

fn created_at(record: &Value) -> &str {
    record
        .get("created_at")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Write pre-encoded records as one compact JSON array, returning its size.
fn write_chunk(path: &Path, records: &[Vec<u8>]) -> ArchiveResult<u64> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(b"[")?;
    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            writer.write_all(b",")?;
        }
        writer.write_all(record)?;
    }
    writer.write_all(b"]")?;
    writer.flush()?;
    drop(writer);

    Ok(fs::metadata(path)?.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_single_chunk_when_under_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let config = PartitionConfig::default().with_output_dir(dir.path());

        let manifest = write_chunks(
            vec![
                json!({"uuid": "a", "created_at": "2024-01-01"}),
                json!({"uuid": "b", "created_at": "2024-03-01"}),
                json!({"uuid": "c"}),
            ],
            &config,
        )
        .unwrap();

        assert_eq!(manifest.total_conversations, 3);
        assert_eq!(manifest.chunks.len(), 1);
        assert_eq!(manifest.chunks[0].file, "conversations_01.json");

        let chunk = read_json(&dir.path().join("conversations_01.json"));
        let ids: Vec<_> = chunk
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["uuid"].clone())
            .collect();
        assert_eq!(ids, vec![json!("b"), json!("a"), json!("c")]);

        let raw = fs::read_to_string(dir.path().join("conversations_01.json")).unwrap();
        assert!(!raw.contains(' '));
    }

    #[test]
    fn test_tiny_threshold_puts_each_record_alone() {
        let dir = tempfile::tempdir().unwrap();
        let config = PartitionConfig::default()
            .with_output_dir(dir.path())
            .with_max_chunk_bytes(1);

        let manifest = write_chunks(
            vec![json!({"uuid": "a"}), json!({"uuid": "b"})],
            &config,
        )
        .unwrap();

        let files: Vec<_> = manifest.chunks.iter().map(|c| c.file.as_str()).collect();
        assert_eq!(files, vec!["conversations_01.json", "conversations_02.json"]);
        assert!(manifest.chunks.iter().all(|c| c.count == 1));

        let on_disk: Manifest =
            serde_json::from_str(&fs::read_to_string(dir.path().join(MANIFEST_FILE)).unwrap())
                .unwrap();
        assert_eq!(on_disk, manifest);
    }

    #[test]
    fn test_split_archive_keeps_duplicates() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        fs::write(
            data.path().join("conversations 1.json"),
            r#"[{"uuid":"a","created_at":"1"}]"#,
        )
        .unwrap();
        fs::write(
            data.path().join("conversations 2.json"),
            r#"[{"uuid":"a","created_at":"2"},{"uuid":"b","created_at":"3"},{"uuid":"c""#,
        )
        .unwrap();

        let archive = ArchiveConfig::new().with_data_dir(data.path());
        let config = PartitionConfig::default().with_output_dir(out.path().join("chunks"));

        let manifest = split_archive(&archive, &config).unwrap();

        assert_eq!(manifest.total_conversations, 3);
        let counted: usize = manifest.chunks.iter().map(|c| c.count).sum();
        assert_eq!(counted, 3);
        assert!(out.path().join("chunks").join(MANIFEST_FILE).exists());
    }

    #[test]
    fn test_empty_sources_write_empty_manifest() {
        let data = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let archive = ArchiveConfig::new().with_data_dir(data.path());
        let config = PartitionConfig::default().with_output_dir(out.path());

        let manifest = split_archive(&archive, &config).unwrap();

        assert_eq!(manifest.total_conversations, 0);
        assert!(manifest.chunks.is_empty());
        assert_eq!(
            read_json(&out.path().join(MANIFEST_FILE)),
            json!({"total_conversations": 0, "chunks": []})
        );
        let written: Vec<_> = fs::read_dir(out.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(written, vec![MANIFEST_FILE]);
    }

    #[test]
    fn test_unwritable_output_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "occupied").unwrap();
        let config = PartitionConfig::default().with_output_dir(&blocker);

        let result = write_chunks(vec![json!({"uuid": "a"})], &config);

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "occupied");
    }

    #[test]
    fn test_chunks_keep_source_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = PartitionConfig::default().with_output_dir(dir.path());
        let record: Value =
            serde_json::from_str(r#"{"uuid":"a","name":"x","created_at":"1"}"#).unwrap();

        write_chunks(vec![record], &config).unwrap();

        let raw = fs::read_to_string(dir.path().join("conversations_01.json")).unwrap();
        assert_eq!(raw, r#"[{"uuid":"a","name":"x","created_at":"1"}]"#);
    }
}

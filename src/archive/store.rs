//! In-memory conversation store keyed by identifier.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use serde_json::Value;

use crate::config::ArchiveConfig;

use super::loader::load_sources;
use super::types::Conversation;

/// Identifier-keyed view of every loaded conversation.
pub type ConversationIndex = HashMap<String, Conversation>;

/// Read-only store built once from the configured sources.
///
/// The index is built on the first call to [`ConversationStore::ensure_loaded`]
/// (or any accessor) and reused for the lifetime of the store. There is no
/// invalidation; a fresh store is needed to pick up changed files.
#[derive(Debug)]
pub struct ConversationStore {
    sources: Vec<PathBuf>,
    index: OnceLock<ConversationIndex>,
}

impl ConversationStore {
    /// Create a store over the numbered sources of `config`. No I/O happens yet.
    #[must_use]
    pub fn new(config: &ArchiveConfig) -> Self {
        Self::with_sources(config.source_paths())
    }

    /// Create a store over an explicit ordered source list.
    #[must_use]
    pub const fn with_sources(sources: Vec<PathBuf>) -> Self {
        Self {
            sources,
            index: OnceLock::new(),
        }
    }

    /// Create an already-populated store. Conversations without an id are dropped.
    #[must_use]
    pub fn from_conversations(conversations: impl IntoIterator<Item = Conversation>) -> Self {
        let index: ConversationIndex = conversations
            .into_iter()
            .filter_map(|conv| conv.uuid.clone().map(|id| (id, conv)))
            .collect();
        Self {
            sources: Vec::new(),
            index: OnceLock::from(index),
        }
    }

    /// Build the index if it has not been built yet, then return it.
    pub fn ensure_loaded(&self) -> &ConversationIndex {
        self.index.get_or_init(|| {
            let outcome = load_sources(&self.sources);
            let index = index_records(outcome.records);
            tracing::info!("Total: {} conversations loaded", index.len());
            index
        })
    }

    /// Whether the one-time build has already run.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.index.get().is_some()
    }

    /// All conversations by id.
    pub fn get_all(&self) -> &ConversationIndex {
        self.ensure_loaded()
    }

    /// Look up one conversation.
    pub fn get_one(&self, id: &str) -> Option<&Conversation> {
        self.ensure_loaded().get(id)
    }

    /// Number of indexed conversations.
    pub fn len(&self) -> usize {
        self.ensure_loaded().len()
    }

    /// Whether no conversation was indexed.
    pub fn is_empty(&self) -> bool {
        self.ensure_loaded().is_empty()
    }
}

/// Fold loaded records into an index. Later records overwrite earlier ones
/// with the same id; records without a string `uuid` are skipped silently.
///
/// Decoding is tolerant field by field, so a record with a string id always
/// lands in the index even when its other fields are oddly typed.
#[must_use]
pub fn index_records(records: Vec<Value>) -> ConversationIndex {
    let mut index = ConversationIndex::with_capacity(records.len());

    for record in records {
        let Some(id) = record.get("uuid").and_then(Value::as_str).map(str::to_owned) else {
            continue;
        };
        let conv = serde_json::from_value::<Conversation>(record).unwrap_or_else(|e| {
            tracing::warn!("Conversation {id} kept with empty fields: {e}");
            Conversation {
                uuid: Some(id.clone()),
                ..Conversation::default()
            }
        });
        index.insert(id, conv);
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_later_duplicates_win() {
        let index = index_records(vec![
            json!({"uuid": "a", "name": "first"}),
            json!({"uuid": "b", "name": "other"}),
            json!({"uuid": "a", "name": "second"}),
        ]);

        assert_eq!(index.len(), 2);
        assert_eq!(index["a"].name.as_deref(), Some("second"));
    }

    #[test]
    fn test_records_without_id_are_dropped() {
        let index = index_records(vec![
            json!({"name": "no id"}),
            json!({"uuid": 7, "name": "numeric id"}),
            json!("not an object"),
            json!({"uuid": "ok"}),
        ]);

        assert_eq!(index.keys().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[test]
    fn test_oddly_typed_record_is_kept() {
        let index = index_records(vec![
            json!({"uuid": "odd", "name": 12}),
            json!({"uuid": "good", "name": "fine"}),
        ]);

        assert_eq!(index["odd"].name, None);
        assert!(index.contains_key("good"));
    }

    #[test]
    fn test_later_duplicate_with_numeric_timestamp_still_wins() {
        let index = index_records(vec![
            json!({"uuid": "a", "name": "old"}),
            json!({"uuid": "a", "name": "new", "created_at": 1_700_000_000}),
        ]);

        assert_eq!(index["a"].name.as_deref(), Some("new"));
        assert_eq!(index["a"].created_at, None);
    }

    #[test]
    fn test_stray_message_does_not_drop_conversation() {
        let index = index_records(vec![json!({
            "uuid": "c",
            "name": "keep me",
            "chat_messages": [{"text": "hi"}, "stray string"]
        })]);

        assert_eq!(index.len(), 1);
        assert_eq!(index["c"].name.as_deref(), Some("keep me"));
        assert_eq!(index["c"].chat_messages[0].flattened_text(), "hi");
    }

    #[test]
    fn test_store_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conversations 1.json");
        std::fs::write(&path, r#"[{"uuid":"a","name":"x"}]"#).unwrap();

        let store = ConversationStore::with_sources(vec![path.clone()]);
        assert!(!store.is_loaded());
        assert_eq!(store.len(), 1);
        assert!(store.is_loaded());

        std::fs::remove_file(&path).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get_one("a").is_some());
        assert!(store.get_one("missing").is_none());
    }

    #[test]
    fn test_store_from_config_uses_last_file_for_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("conversations 1.json"),
            r#"[{"uuid":"a","name":"old"}]"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("conversations 3.json"),
            r#"{"uuid":"a","name":"new"}"#,
        )
        .unwrap();

        let config = ArchiveConfig::new().with_data_dir(dir.path());
        let store = ConversationStore::new(&config);

        assert_eq!(store.len(), 1);
        assert_eq!(
            store.get_one("a").and_then(|c| c.name.as_deref()),
            Some("new")
        );
    }
}

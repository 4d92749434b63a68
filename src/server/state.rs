//! Application state shared across all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use crate::archive::ConversationStore;
use crate::config::{ArchiveConfig, ServerConfig};

/// Shared application state.
#[derive(Debug)]
pub struct AppState {
    /// Read-only conversation store.
    pub store: ConversationStore,
    /// Directory served for non-API paths.
    pub static_dir: PathBuf,
}

impl AppState {
    /// Create state over the configured archive. Nothing is loaded yet.
    #[must_use]
    pub fn new(archive: &ArchiveConfig, server: &ServerConfig) -> Arc<Self> {
        Self::from_store(ConversationStore::new(archive), server.static_dir.clone())
    }

    /// Wrap an existing store.
    #[must_use]
    pub fn from_store(store: ConversationStore, static_dir: PathBuf) -> Arc<Self> {
        Arc::new(Self { store, static_dir })
    }
}

//! Conversation archive loading and querying.
//!
//! Provides:
//! - A recovering JSON loader that tolerates missing and truncated exports
//! - A read-only, identifier-keyed store built once per process
//! - List, fetch-one and substring search views for the HTTP API

pub mod error;
pub mod loader;
pub mod query;
pub mod store;
pub mod types;

pub use error::{ArchiveError, ArchiveResult};
pub use loader::{FileReport, FileStatus, LoadOutcome, load_sources, salvage_truncated_array};
pub use query::{
    ConversationDetail, ConversationSummary, MatchType, MessageView, SearchHit,
    conversation_detail, list_conversations, search_conversations,
};
pub use store::{ConversationIndex, ConversationStore};
pub use types::{ContentBlock, Conversation, Message, MessageContent};

//! List, fetch-one and search views over the conversation index.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::store::ConversationIndex;
use super::types::{Conversation, Message};

/// Hard cap on search results.
pub const SEARCH_RESULT_LIMIT: usize = 100;
/// Name shown for conversations without one.
pub const UNTITLED: &str = "Untitled";
/// Sender shown for messages without one.
pub const UNKNOWN_SENDER: &str = "unknown";

/// Sidebar entry for one conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation id.
    pub uuid: String,
    /// Display name.
    pub name: String,
    /// Summary, empty when absent.
    pub summary: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Number of messages.
    pub message_count: usize,
}

/// A message ready for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    /// Message id.
    pub uuid: String,
    /// Sender role.
    pub sender: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Flattened text content.
    pub content: String,
    /// Attachment metadata as exported.
    pub attachments: Value,
    /// File metadata as exported.
    pub files: Value,
}

/// Full conversation with formatted messages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    /// Conversation id.
    pub uuid: String,
    /// Display name.
    pub name: String,
    /// Summary, empty when absent.
    pub summary: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
    /// Messages in original order.
    pub messages: Vec<MessageView>,
}

/// Where a search query matched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchType {
    /// The name or summary contains the query.
    #[serde(rename = "title/summary")]
    TitleOrSummary,
    /// A message contains the query.
    #[serde(rename = "message")]
    Message,
}

/// One search result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Conversation id.
    pub uuid: String,
    /// Display name.
    pub name: String,
    /// Summary, empty when absent.
    pub summary: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Where the match was found.
    pub match_type: MatchType,
}

/// Every conversation as a summary, newest first.
#[must_use]
pub fn list_conversations(index: &ConversationIndex) -> Vec<ConversationSummary> {
    newest_first(index)
        .into_iter()
        .map(|(id, conv)| ConversationSummary {
            uuid: id.to_string(),
            name: display_name(conv),
            summary: text_or_empty(conv.summary.as_ref()),
            created_at: text_or_empty(conv.created_at.as_ref()),
            updated_at: text_or_empty(conv.updated_at.as_ref()),
            message_count: conv.chat_messages.len(),
        })
        .collect()
}

/// One conversation with flattened messages, or `None` if the id is unknown.
#[must_use]
pub fn conversation_detail(index: &ConversationIndex, id: &str) -> Option<ConversationDetail> {
    let conv = index.get(id)?;
    Some(ConversationDetail {
        uuid: id.to_string(),
        name: display_name(conv),
        summary: text_or_empty(conv.summary.as_ref()),
        created_at: text_or_empty(conv.created_at.as_ref()),
        updated_at: text_or_empty(conv.updated_at.as_ref()),
        messages: conv.chat_messages.iter().map(message_view).collect(),
    })
}

/// Case-insensitive substring search, newest first, capped at [`SEARCH_RESULT_LIMIT`].
///
/// Name and summary are checked first. Otherwise messages are scanned in
/// order and scanning stops at the first match, so a hit never says how many
/// messages matched.
#[must_use]
pub fn search_conversations(index: &ConversationIndex, query: &str) -> Vec<SearchHit> {
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    newest_first(index)
        .into_iter()
        .filter_map(|(id, conv)| {
            let match_type = match_conversation(conv, &needle)?;
            Some(SearchHit {
                uuid: id.to_string(),
                name: display_name(conv),
                summary: text_or_empty(conv.summary.as_ref()),
                created_at: text_or_empty(conv.created_at.as_ref()),
                match_type,
            })
        })
        .take(SEARCH_RESULT_LIMIT)
        .collect()
}

fn match_conversation(conv: &Conversation, needle: &str) -> Option<MatchType> {
    let contains = |field: Option<&String>| {
        field.is_some_and(|s| s.to_lowercase().contains(needle))
    };

    if contains(conv.name.as_ref()) || contains(conv.summary.as_ref()) {
        return Some(MatchType::TitleOrSummary);
    }

    conv.chat_messages
        .iter()
        .any(|msg| msg.flattened_text().to_lowercase().contains(needle))
        .then_some(MatchType::Message)
}

fn message_view(msg: &Message) -> MessageView {
    MessageView {
        uuid: text_or_empty(msg.uuid.as_ref()),
        sender: msg
            .sender
            .clone()
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
        created_at: text_or_empty(msg.created_at.as_ref()),
        content: msg.flattened_text(),
        attachments: msg.attachments.clone().unwrap_or_else(empty_list),
        files: msg.files.clone().unwrap_or_else(empty_list),
    }
}

/// Entries sorted by `created_at` descending (raw string order, missing last),
/// ties broken by id so repeated calls agree.
fn newest_first(index: &ConversationIndex) -> Vec<(&str, &Conversation)> {
    let mut entries: Vec<(&str, &Conversation)> =
        index.iter().map(|(id, conv)| (id.as_str(), conv)).collect();
    entries.sort_by(|(a_id, a), (b_id, b)| {
        let a_created = a.created_at.as_deref().unwrap_or_default();
        let b_created = b.created_at.as_deref().unwrap_or_default();
        b_created.cmp(a_created).then_with(|| a_id.cmp(b_id))
    });
    entries
}

fn display_name(conv: &Conversation) -> String {
    conv.name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or(UNTITLED)
        .to_string()
}

fn text_or_empty(field: Option<&String>) -> String {
    field.cloned().unwrap_or_default()
}

const fn empty_list() -> Value {
    Value::Array(Vec::new())
}

//! Typed view over exported conversation records.
//!
//! Exports are loosely shaped: most fields may be absent or `null`, and message
//! payloads mix plain strings with typed blocks. Every field is therefore
//! optional here and unknown block kinds deserialize into an ignored variant
//! instead of failing the whole record.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// One archived chat session.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Conversation {
    /// Unique identifier. Records without one are never indexed.
    #[serde(default, deserialize_with = "string_or_none")]
    pub uuid: Option<String>,
    /// Display name.
    #[serde(default, deserialize_with = "string_or_none")]
    pub name: Option<String>,
    /// Optional summary.
    #[serde(default, deserialize_with = "string_or_none")]
    pub summary: Option<String>,
    /// Creation timestamp, kept as the raw sortable string.
    #[serde(default, deserialize_with = "string_or_none")]
    pub created_at: Option<String>,
    /// Last update timestamp, kept as the raw sortable string.
    #[serde(default, deserialize_with = "string_or_none")]
    pub updated_at: Option<String>,
    /// Ordered messages. Entries that are not message objects become empty messages.
    #[serde(default, deserialize_with = "lenient_messages")]
    pub chat_messages: Vec<Message>,
}

/// One turn within a conversation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Message {
    /// Unique identifier.
    #[serde(default, deserialize_with = "string_or_none")]
    pub uuid: Option<String>,
    /// Sender role, e.g. `human` or `assistant`.
    #[serde(default, deserialize_with = "string_or_none")]
    pub sender: Option<String>,
    /// Creation timestamp.
    #[serde(default, deserialize_with = "string_or_none")]
    pub created_at: Option<String>,
    /// Plain text rendition shipped by some exports alongside `content`.
    #[serde(default, deserialize_with = "string_or_none")]
    pub text: Option<String>,
    /// Structured payload.
    #[serde(default)]
    pub content: Option<MessageContent>,
    /// Attachment metadata as exported, `null` included. `None` only when absent.
    #[serde(default, deserialize_with = "present_value")]
    pub attachments: Option<Value>,
    /// File metadata as exported, `null` included. `None` only when absent.
    #[serde(default, deserialize_with = "present_value")]
    pub files: Option<Value>,
}

/// Message payload: a bare string or a list of blocks.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Whole payload as one string.
    Plain(String),
    /// Sequence of typed blocks.
    Blocks(Vec<ContentBlock>),
    /// Any other JSON shape; contributes nothing when rendered.
    Other(Value),
}

/// One unit of a structured message payload.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "RawBlock")]
pub enum ContentBlock {
    /// `{"type": "text", "text": ...}`.
    Text(String),
    /// `{"type": "tool_use", "name": ...}`.
    ToolUse {
        /// Invoked tool name.
        name: String,
    },
    /// `{"type": "tool_result", "content": ...}`, content already rendered to text.
    ToolResult(String),
    /// A bare string inside the block list.
    RawString(String),
    /// A block kind the explorer does not render.
    Unsupported,
}

#[allow(dead_code)]
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBlock {
    Plain(String),
    Tagged(TaggedBlock),
    Other(Value),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedBlock {
    Text {
        #[serde(default)]
        text: Option<String>,
    },
    ToolUse {
        #[serde(default)]
        name: Option<String>,
    },
    ToolResult {
        #[serde(default)]
        content: Option<Value>,
    },
}

impl From<RawBlock> for ContentBlock {
    fn from(raw: RawBlock) -> Self {
        match raw {
            RawBlock::Plain(s) => Self::RawString(s),
            RawBlock::Tagged(TaggedBlock::Text { text }) => Self::Text(text.unwrap_or_default()),
            RawBlock::Tagged(TaggedBlock::ToolUse { name }) => Self::ToolUse {
                name: name.unwrap_or_else(|| "unknown".to_string()),
            },
            RawBlock::Tagged(TaggedBlock::ToolResult { content }) => {
                Self::ToolResult(match content {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s,
                    Some(other) => other.to_string(),
                })
            }
            RawBlock::Other(_) => Self::Unsupported,
        }
    }
}

impl ContentBlock {
    /// Text contributed by this block to the flattened message, if any.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Text(text) | Self::RawString(text) => Some(text.clone()),
            Self::ToolUse { name } => Some(format!("\n[Tool: {name}]\n")),
            Self::ToolResult(content) => Some(format!("\n[Tool Result]\n{content}")),
            Self::Unsupported => None,
        }
    }
}

impl Message {
    /// Flatten the message into one newline-joined text blob.
    ///
    /// The plain `text` field comes first when non-empty, followed by every
    /// renderable content block in order.
    #[must_use]
    pub fn flattened_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(text) = self.text.as_deref().filter(|t| !t.is_empty()) {
            parts.push(text.to_string());
        }

        match &self.content {
            Some(MessageContent::Plain(s)) if !s.is_empty() => parts.push(s.clone()),
            Some(MessageContent::Blocks(blocks)) => {
                parts.extend(blocks.iter().filter_map(ContentBlock::render));
            }
            _ => {}
        }

        parts.join("\n")
    }
}

/// Strings pass through; `null` and any other JSON type read as absent.
fn string_or_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Decode each entry on its own so one odd message never drops the conversation.
fn lenient_messages<'de, D>(deserializer: D) -> Result<Vec<Message>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(entries) = Value::deserialize(deserializer)? else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .map(|entry| Message::deserialize(entry).unwrap_or_default())
        .collect())
}

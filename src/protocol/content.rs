//! Content block types for messages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::de::null_default;

/// A content block within an assistant or user message.
///
/// Blocks are discriminated by their `type` field. A block whose `type` is not
/// one of the variants below fails to decode, which in turn downgrades the
/// enclosing record to [`Message::Unknown`](super::Message::Unknown).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text content.
    Text(TextBlock),
    /// A tool use request from the assistant.
    ToolUse(ToolUseBlock),
    /// A tool result returned to the assistant.
    ToolResult(ToolResultBlock),
    /// Thinking block (extended thinking feature).
    Thinking(ThinkingBlock),
}

/// Plain text content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// The text content.
    pub text: String,
}

/// A tool use request from the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolUseBlock {
    /// Unique identifier for this tool use.
    pub id: String,
    /// Name of the tool being invoked.
    pub name: String,
    /// Input parameters, passed through untouched.
    #[serde(default)]
    pub input: Value,
}

/// A tool result returned to the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResultBlock {
    /// ID of the tool_use this result corresponds to.
    pub tool_use_id: String,
    /// The result content: a string, a list of blocks, or absent.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub content: Value,
    /// Whether the tool execution resulted in an error.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResultBlock {
    /// Get the content as a string (concatenates text blocks if structured).
    pub fn content_text(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            Value::Array(blocks) => blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => String::new(),
        }
    }
}

/// Thinking block for extended thinking feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThinkingBlock {
    /// The thinking text (may be redacted).
    pub thinking: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl ContentBlock {
    /// The wire `type` of this block.
    pub fn block_type(&self) -> &'static str {
        match self {
            ContentBlock::Text(_) => "text",
            ContentBlock::ToolUse(_) => "tool_use",
            ContentBlock::ToolResult(_) => "tool_result",
            ContentBlock::Thinking(_) => "thinking",
        }
    }

    /// Get as text block if applicable.
    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            ContentBlock::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Get as tool use block if applicable.
    pub fn as_tool_use(&self) -> Option<&ToolUseBlock> {
        match self {
            ContentBlock::ToolUse(t) => Some(t),
            _ => None,
        }
    }

    /// Get as tool result block if applicable.
    pub fn as_tool_result(&self) -> Option<&ToolResultBlock> {
        match self {
            ContentBlock::ToolResult(t) => Some(t),
            _ => None,
        }
    }

    /// Extract the text content if this is a text block.
    pub fn text(&self) -> Option<&str> {
        self.as_text().map(|t| t.text.as_str())
    }
}

/// The `tool_use_result` side channel on assistant and user records.
///
/// The CLI sends either a bare string (typically command output) or an object
/// describing the tool run. Exactly one representation is populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolUseResult {
    /// Bare string form.
    Text(String),
    /// Object form.
    Structured(StructuredToolUseResult),
    /// Any other JSON shape, kept verbatim.
    Other(Value),
}

impl ToolUseResult {
    /// Get the string form, if that is what was sent.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ToolUseResult::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the object form, if that is what was sent.
    pub fn as_structured(&self) -> Option<&StructuredToolUseResult> {
        match self {
            ToolUseResult::Structured(s) => Some(s),
            _ => None,
        }
    }
}

/// Object form of [`ToolUseResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StructuredToolUseResult {
    #[serde(skip_serializing_if = "Vec::is_empty", deserialize_with = "null_default")]
    pub filenames: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_files: Option<u64>,
    #[serde(deserialize_with = "null_default")]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub interrupted: bool,
    #[serde(deserialize_with = "null_default")]
    pub is_image: bool,
}

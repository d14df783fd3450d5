//! CLI message types for the stream-json protocol.
//!
//! JSON-RPC responses share the stdout stream with chat records but carry no
//! chat `type`, so they decode as [`Message::Unknown`]. A plain chat consumer
//! therefore sees them as unknown records; the engine's correlation loop
//! re-parses [`Message::raw`] to pick them out.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::content::{ContentBlock, ToolResultBlock, ToolUseBlock, ToolUseResult};
use super::de::null_default;
use super::events::StreamEvent;
use super::usage::{ModelUsage, Usage};

/// The exact bytes of one input line, trimmed of surrounding whitespace.
///
/// Each message owns its own buffer. Access is through a shared slice, so the
/// bytes cannot be mutated after decoding.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct RawLine(Box<[u8]>);

impl RawLine {
    /// Copy `bytes` into a new owned buffer.
    pub fn new(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The line as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RawLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawLine({:?})", String::from_utf8_lossy(&self.0))
    }
}

impl AsRef<[u8]> for RawLine {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// A message read from the Claude CLI output.
///
/// Every variant keeps the bytes it was decoded from; see [`Message::raw`].
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Session initialization and status.
    System(SystemMessage),
    /// Assistant response message.
    Assistant(AssistantMessage),
    /// User message (typically tool results).
    User(UserMessage),
    /// Final result message.
    Result(ResultMessage),
    /// Partial-message streaming event.
    StreamEvent(StreamEventMessage),
    /// Foreign record, or a known record that failed to decode.
    Unknown(UnknownMessage),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type", default, deserialize_with = "null_default")]
    message_type: String,
}

/// Invalid UTF-8 is replaced with U+FFFD before decoding; the raw line keeps
/// the original bytes.
fn decode_payload<T: DeserializeOwned>(raw: &RawLine) -> serde_json::Result<T> {
    serde_json::from_str(&String::from_utf8_lossy(raw.as_bytes()))
}

impl Message {
    /// Read only the `type` tag of a line.
    pub(crate) fn envelope_type(line: &[u8]) -> serde_json::Result<String> {
        serde_json::from_str::<Envelope>(&String::from_utf8_lossy(line)).map(|e| e.message_type)
    }

    /// Decode a line whose envelope has already been read.
    ///
    /// Never fails: a known tag whose payload does not decode becomes
    /// [`Message::Unknown`] with the decode error attached.
    pub(crate) fn decode(message_type: String, raw: RawLine) -> Message {
        let (label, decoded) = match message_type.as_str() {
            "system" => ("system", decode_payload(&raw).map(Message::System)),
            "assistant" => ("assistant", decode_payload(&raw).map(Message::Assistant)),
            "user" => ("user", decode_payload(&raw).map(Message::User)),
            "result" => ("result", decode_payload(&raw).map(Message::Result)),
            "stream_event" => ("stream event", decode_payload(&raw).map(Message::StreamEvent)),
            _ => {
                return Message::Unknown(UnknownMessage {
                    message_type,
                    raw,
                    parse_error: None,
                })
            }
        };

        match decoded {
            Ok(mut message) => {
                message.set_raw(raw);
                message
            }
            Err(err) => {
                let parse_error = format!("parse {label} message: {err}");
                tracing::debug!(message_type = %message_type, error = %err, "record degraded to unknown");
                Message::Unknown(UnknownMessage {
                    message_type,
                    raw,
                    parse_error: Some(parse_error),
                })
            }
        }
    }

    fn set_raw(&mut self, raw: RawLine) {
        match self {
            Message::System(m) => m.raw = raw,
            Message::Assistant(m) => m.raw = raw,
            Message::User(m) => m.raw = raw,
            Message::Result(m) => m.raw = raw,
            Message::StreamEvent(m) => m.raw = raw,
            Message::Unknown(m) => m.raw = raw,
        }
    }

    fn raw_line(&self) -> &RawLine {
        match self {
            Message::System(m) => &m.raw,
            Message::Assistant(m) => &m.raw,
            Message::User(m) => &m.raw,
            Message::Result(m) => &m.raw,
            Message::StreamEvent(m) => &m.raw,
            Message::Unknown(m) => &m.raw,
        }
    }

    /// The wire `type` tag.
    ///
    /// For [`Message::Unknown`] this is whatever tag the line carried, empty
    /// when it had none.
    pub fn message_type(&self) -> &str {
        match self {
            Message::System(_) => "system",
            Message::Assistant(_) => "assistant",
            Message::User(_) => "user",
            Message::Result(_) => "result",
            Message::StreamEvent(_) => "stream_event",
            Message::Unknown(m) => &m.message_type,
        }
    }

    /// The exact trimmed bytes of the line this message was decoded from.
    pub fn raw(&self) -> &[u8] {
        self.raw_line().as_bytes()
    }

    /// The raw line as text, if it is valid UTF-8.
    pub fn raw_str(&self) -> Option<&str> {
        self.raw_line().as_str()
    }

    /// An owned copy of the raw line.
    pub fn raw_bytes(&self) -> Vec<u8> {
        self.raw().to_vec()
    }

    /// Get the session ID if present.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Message::System(m) => m.session_id.as_deref(),
            Message::Assistant(m) => m.session_id.as_deref(),
            Message::User(m) => m.session_id.as_deref(),
            Message::Result(m) => m.session_id.as_deref(),
            Message::StreamEvent(m) => m.session_id.as_deref(),
            Message::Unknown(_) => None,
        }
    }

    /// Check if this is a system init message.
    pub fn is_system_init(&self) -> bool {
        matches!(self, Message::System(m) if m.is_init())
    }

    /// Check if this is a result message.
    pub fn is_result(&self) -> bool {
        matches!(self, Message::Result(_))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Message::Unknown(_))
    }

    pub fn as_system(&self) -> Option<&SystemMessage> {
        match self {
            Message::System(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_assistant(&self) -> Option<&AssistantMessage> {
        match self {
            Message::Assistant(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserMessage> {
        match self {
            Message::User(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_result(&self) -> Option<&ResultMessage> {
        match self {
            Message::Result(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_stream_event(&self) -> Option<&StreamEventMessage> {
        match self {
            Message::StreamEvent(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_unknown(&self) -> Option<&UnknownMessage> {
        match self {
            Message::Unknown(m) => Some(m),
            _ => None,
        }
    }
}

/// System message sent at the start of a session and on status changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemMessage {
    /// Subtype of system message (`init` for the session header).
    #[serde(deserialize_with = "null_default")]
    pub subtype: String,
    pub uuid: Option<String>,
    pub session_id: Option<String>,
    /// Current working directory.
    pub cwd: Option<String>,
    /// Model being used.
    pub model: Option<String>,
    /// Enabled tool names.
    #[serde(deserialize_with = "null_default")]
    pub tools: Vec<String>,
    /// Connected MCP servers.
    #[serde(deserialize_with = "null_default")]
    pub mcp_servers: Vec<McpServerStatus>,
    #[serde(rename = "permissionMode")]
    pub permission_mode: Option<String>,
    #[serde(rename = "apiKeySource")]
    pub api_key_source: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub slash_commands: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub agents: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub skills: Vec<String>,
    #[serde(deserialize_with = "null_default")]
    pub plugins: Vec<PluginInfo>,
    pub output_style: Option<String>,
    pub claude_code_version: Option<String>,
    #[serde(skip)]
    raw: RawLine,
}

impl SystemMessage {
    /// Check if this is an init message.
    pub fn is_init(&self) -> bool {
        self.subtype == "init"
    }

    pub fn raw(&self) -> &[u8] {
        self.raw.as_bytes()
    }
}

/// Connection state of one MCP server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServerStatus {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub status: String,
}

/// A loaded plugin and its install path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginInfo {
    #[serde(deserialize_with = "null_default")]
    pub name: String,
    #[serde(deserialize_with = "null_default")]
    pub path: String,
}

/// Assistant response message containing model output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantMessage {
    pub uuid: Option<String>,
    pub session_id: Option<String>,
    /// Set when the message belongs to a subagent run.
    pub parent_tool_use_id: Option<String>,
    /// The message content.
    #[serde(deserialize_with = "null_default")]
    pub message: AssistantPayload,
    pub tool_use_result: Option<ToolUseResult>,
    #[serde(skip)]
    raw: RawLine,
}

impl AssistantMessage {
    pub fn raw(&self) -> &[u8] {
        self.raw.as_bytes()
    }
}

/// Content of an assistant message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantPayload {
    pub id: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub payload_type: Option<String>,
    pub role: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub content: Vec<ContentBlock>,
    /// Reason the message stopped.
    pub stop_reason: Option<String>,
    pub stop_sequence: Option<String>,
    /// Token usage for this message.
    pub usage: Option<Usage>,
}

impl AssistantPayload {
    /// Get all text content concatenated.
    pub fn text(&self) -> String {
        self.content.iter().filter_map(|block| block.text()).collect()
    }

    /// Get all tool use blocks.
    pub fn tool_uses(&self) -> Vec<&ToolUseBlock> {
        self.content
            .iter()
            .filter_map(|block| block.as_tool_use())
            .collect()
    }

    /// Check if the message stopped for tool use.
    pub fn is_tool_use(&self) -> bool {
        self.stop_reason.as_deref() == Some("tool_use")
    }
}

/// User message (typically containing tool results).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMessage {
    pub uuid: Option<String>,
    pub session_id: Option<String>,
    pub parent_tool_use_id: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub message: UserPayload,
    /// Side-channel tool output, as a string or an object.
    pub tool_use_result: Option<ToolUseResult>,
    pub usage: Option<Usage>,
    #[serde(skip)]
    raw: RawLine,
}

impl UserMessage {
    pub fn raw(&self) -> &[u8] {
        self.raw.as_bytes()
    }
}

/// Content of a user message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPayload {
    pub role: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub content: Vec<ContentBlock>,
}

impl UserPayload {
    /// Get all tool result blocks.
    pub fn tool_results(&self) -> Vec<&ToolResultBlock> {
        self.content
            .iter()
            .filter_map(|block| block.as_tool_result())
            .collect()
    }
}

/// Final result message with summary statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultMessage {
    /// Result subtype (`success`, `error_max_turns`, ...).
    #[serde(deserialize_with = "null_default")]
    pub subtype: String,
    pub uuid: Option<String>,
    pub session_id: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub is_error: bool,
    pub duration_ms: Option<u64>,
    pub duration_api_ms: Option<u64>,
    pub num_turns: Option<u32>,
    /// Final text result.
    pub result: Option<String>,
    pub stop_reason: Option<String>,
    pub total_cost_usd: Option<f64>,
    /// Aggregate token usage.
    pub usage: Option<Usage>,
    /// Per-model counters keyed by model name.
    #[serde(rename = "modelUsage", deserialize_with = "null_default")]
    pub model_usage: BTreeMap<String, ModelUsage>,
    #[serde(deserialize_with = "null_default")]
    pub permission_denials: Vec<PermissionDenial>,
    pub structured_output: Option<Value>,
    #[serde(deserialize_with = "null_default")]
    pub errors: Vec<String>,
    #[serde(skip)]
    raw: RawLine,
}

impl ResultMessage {
    /// Check if this is a success result.
    pub fn is_success(&self) -> bool {
        self.subtype == "success" && !self.is_error
    }

    /// Get the duration as a std::time::Duration.
    pub fn duration(&self) -> Option<std::time::Duration> {
        self.duration_ms.map(std::time::Duration::from_millis)
    }

    pub fn raw(&self) -> &[u8] {
        self.raw.as_bytes()
    }
}

/// A tool call the permission layer refused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PermissionDenial {
    #[serde(deserialize_with = "null_default")]
    pub tool_name: String,
    #[serde(deserialize_with = "null_default")]
    pub tool_use_id: String,
    pub tool_input: Value,
}

/// Wrapper for streaming events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEventMessage {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub parent_tool_use_id: Option<String>,
    /// The streaming event.
    pub event: StreamEvent,
    #[serde(skip)]
    raw: RawLine,
}

impl StreamEventMessage {
    pub fn raw(&self) -> &[u8] {
        self.raw.as_bytes()
    }
}

/// A record the decoder could not map onto a known message kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnknownMessage {
    /// The `type` tag the line carried, empty when absent.
    pub message_type: String,
    /// Why a known tag failed to decode. `None` for foreign records.
    pub parse_error: Option<String>,
    raw: RawLine,
}

impl UnknownMessage {
    pub fn raw(&self) -> &[u8] {
        self.raw.as_bytes()
    }

    /// True when the tag was known but the payload was malformed.
    pub fn is_malformed(&self) -> bool {
        self.parse_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(line: &str) -> Message {
        let tag = Message::envelope_type(line.as_bytes()).unwrap();
        Message::decode(tag, RawLine::new(line.as_bytes()))
    }

    #[test]
    fn parse_system_init() {
        let line = r#"{"type":"system","subtype":"init","cwd":"/home/user/project","session_id":"550e8400","tools":["Bash","Read","Edit"],"mcp_servers":[{"name":"ruby-tools","status":"connected"}],"model":"claude-sonnet-4-5-20250929","permissionMode":"default","apiKeySource":"none","slash_commands":["compact"],"agents":["general-purpose"],"skills":[],"plugins":[{"name":"demo","path":"/p/demo"}],"output_style":"default","claude_code_version":"2.0.76"}"#;
        let msg = decode(line);
        assert!(msg.is_system_init());
        assert_eq!(msg.message_type(), "system");
        assert_eq!(msg.session_id(), Some("550e8400"));
        let system = msg.as_system().unwrap();
        assert_eq!(system.tools, vec!["Bash", "Read", "Edit"]);
        assert_eq!(system.mcp_servers[0].status, "connected");
        assert_eq!(system.api_key_source.as_deref(), Some("none"));
        assert_eq!(system.plugins[0].path, "/p/demo");
        assert_eq!(system.output_style.as_deref(), Some("default"));
        assert_eq!(msg.raw(), line.as_bytes());
        assert_eq!(system.raw(), line.as_bytes());
    }

    #[test]
    fn parse_assistant_with_tool_use() {
        let line = r#"{"type":"assistant","message":{"id":"msg_01","model":"claude","type":"message","role":"assistant","content":[{"type":"text","text":"Let me check."},{"type":"tool_use","id":"toolu_01","name":"Read","input":{"path":"/tmp/t"}}],"stop_reason":"tool_use","stop_sequence":null,"usage":{"input_tokens":3,"output_tokens":2}},"parent_tool_use_id":null,"session_id":"s1","uuid":"u1"}"#;
        let msg = decode(line);
        let assistant = msg.as_assistant().unwrap();
        assert_eq!(assistant.uuid.as_deref(), Some("u1"));
        assert!(assistant.parent_tool_use_id.is_none());
        assert!(assistant.message.is_tool_use());
        assert_eq!(assistant.message.text(), "Let me check.");
        assert_eq!(assistant.message.tool_uses()[0].name, "Read");
        assert_eq!(assistant.message.usage.as_ref().map(|u| u.input_tokens), Some(3));
    }

    #[test]
    fn parse_user_with_tool_use_result() {
        let line = r#"{"type":"user","message":{"role":"user","content":[{"tool_use_id":"toolu_01","type":"tool_result","content":"a.txt"}]},"parent_tool_use_id":null,"session_id":"s1","uuid":"u2","tool_use_result":{"filenames":["a.txt"],"durationMs":7,"numFiles":1,"truncated":false}}"#;
        let msg = decode(line);
        let user = msg.as_user().unwrap();
        assert_eq!(user.message.tool_results()[0].tool_use_id, "toolu_01");
        let structured = user.tool_use_result.as_ref().and_then(|r| r.as_structured()).unwrap();
        assert_eq!(structured.num_files, Some(1));
    }

    #[test]
    fn parse_result_with_model_usage() {
        let line = r#"{"type":"result","subtype":"success","is_error":false,"duration_ms":2475,"duration_api_ms":2335,"num_turns":1,"result":"4","session_id":"s1","total_cost_usd":0.0019,"usage":{"input_tokens":2,"output_tokens":5},"modelUsage":{"claude-haiku":{"inputTokens":2,"outputTokens":170,"costUSD":0.0019}},"permission_denials":[{"tool_name":"Bash","tool_use_id":"toolu_9","tool_input":{"command":"rm -rf /"}}],"errors":["boom"]}"#;
        let msg = decode(line);
        let result = msg.as_result().unwrap();
        assert!(result.is_success());
        assert_eq!(result.duration(), Some(std::time::Duration::from_millis(2475)));
        assert_eq!(result.duration_api_ms, Some(2335));
        assert_eq!(result.model_usage["claude-haiku"].output_tokens, 170);
        assert_eq!(result.permission_denials[0].tool_input["command"], "rm -rf /");
        assert_eq!(result.errors, vec!["boom"]);
    }

    #[test]
    fn parse_stream_event_message() {
        let line = r#"{"type":"stream_event","event":{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Dogs are loyal"}},"session_id":"s1","parent_tool_use_id":null,"uuid":"u3"}"#;
        let msg = decode(line);
        let event = msg.as_stream_event().unwrap();
        assert_eq!(event.event.text_delta(), Some("Dogs are loyal"));
        assert_eq!(msg.message_type(), "stream_event");
    }

    #[test]
    fn foreign_tag_is_unknown_without_diagnostic() {
        let line = r#"{"jsonrpc":"2.0","id":1,"result":{}}"#;
        let msg = decode(line);
        let unknown = msg.as_unknown().unwrap();
        assert_eq!(msg.message_type(), "");
        assert!(!unknown.is_malformed());
        assert_eq!(unknown.raw(), line.as_bytes());
    }

    #[test]
    fn malformed_known_record_keeps_diagnostic() {
        let line = r#"{"type":"user","message":{"content":"not-an-array"}}"#;
        let msg = decode(line);
        let unknown = msg.as_unknown().unwrap();
        assert_eq!(unknown.message_type, "user");
        assert!(unknown
            .parse_error
            .as_deref()
            .unwrap()
            .starts_with("parse user message:"));
        assert_eq!(msg.raw(), line.as_bytes());
    }

    #[test]
    fn unknown_stream_event_kind_degrades() {
        let line = r#"{"type":"stream_event","event":{"type":"ping"}}"#;
        let msg = decode(line);
        assert_eq!(msg.message_type(), "stream_event");
        assert!(msg.is_unknown());
    }

    #[test]
    fn raw_bytes_is_an_independent_copy() {
        let line = r#"{"type":"result","subtype":"success"}"#;
        let msg = decode(line);
        let mut copy = msg.raw_bytes();
        copy[0] = b'X';
        assert_eq!(msg.raw(), line.as_bytes());
        assert_eq!(msg.raw_str(), Some(line));
    }

    #[test]
    fn envelope_rejects_invalid_json() {
        assert!(Message::envelope_type(br#"{"type":"#).is_err());
        assert_eq!(Message::envelope_type(b"{}").unwrap(), "");
    }

    #[test]
    fn null_tag_is_untyped_unknown() {
        let msg = decode(r#"{"type":null,"x":1}"#);
        let unknown = msg.as_unknown().unwrap();
        assert_eq!(unknown.message_type, "");
        assert!(!unknown.is_malformed());
    }

    #[test]
    fn null_collections_decode_as_empty() {
        let system = decode(r#"{"type":"system","subtype":"init","tools":null,"mcp_servers":null,"slash_commands":null,"agents":null,"skills":null,"plugins":null}"#);
        let system = system.as_system().unwrap();
        assert!(system.is_init());
        assert!(system.tools.is_empty());
        assert!(system.plugins.is_empty());

        let assistant = decode(r#"{"type":"assistant","message":{"role":"assistant","content":null,"usage":{"input_tokens":1,"output_tokens":null,"cache_creation":null,"server_tool_use":null}}}"#);
        let payload = &assistant.as_assistant().unwrap().message;
        assert!(payload.content.is_empty());
        let usage = payload.usage.as_ref().unwrap();
        assert_eq!(usage.input_tokens, 1);
        assert_eq!(usage.output_tokens, 0);
        assert!(usage.cache_creation.is_empty());

        let result = decode(r#"{"type":"result","subtype":"success","is_error":null,"modelUsage":null,"permission_denials":null,"errors":null,"usage":{"server_tool_use":null}}"#);
        let result = result.as_result().unwrap();
        assert!(result.is_success());
        assert!(result.model_usage.is_empty());
        assert!(result.permission_denials.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn invalid_utf8_keeps_original_bytes() {
        let line = b"{\"type\":\"result\",\"subtype\":\"success\",\"result\":\"caf\xff\"}";
        let tag = Message::envelope_type(line).unwrap();
        let msg = Message::decode(tag, RawLine::new(line));
        assert_eq!(msg.as_result().unwrap().result.as_deref(), Some("caf\u{fffd}"));
        assert_eq!(msg.raw(), &line[..]);
        assert!(msg.raw_str().is_none());
    }
}

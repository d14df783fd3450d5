//! Wire types for Claude CLI communication.
//!
//! This module defines the records exchanged with the Claude CLI when it runs
//! with `--output-format stream-json`, plus the JSON-RPC envelopes used for
//! the MCP control channel that shares the same stdout.
//!
//! # Message Types
//!
//! The CLI outputs newline-delimited JSON messages of these types:
//!
//! - [`SystemMessage`]: Initialization info (session ID, tools, model)
//! - [`AssistantMessage`]: Model responses with text and tool use
//! - [`UserMessage`]: Tool results returned to the model
//! - [`StreamEventMessage`]: Real-time streaming events
//! - [`ResultMessage`]: Final summary with cost and usage
//! - [`UnknownMessage`]: Anything else, including JSON-RPC responses
//!
//! # Example
//!
//! ```
//! use claudekit::parser::parse_line;
//!
//! let line = br#"{"type": "assistant", "message": {"id": "msg_01", "role": "assistant", "content": [{"type": "text", "text": "Hello!"}]}}"#;
//! let msg = parse_line(line).unwrap().unwrap();
//!
//! if let Some(assistant) = msg.as_assistant() {
//!     assert_eq!(assistant.message.text(), "Hello!");
//! }
//! assert_eq!(msg.raw(), &line[..]);
//! ```

mod content;
mod de;
mod events;
mod input;
mod jsonrpc;
mod messages;
mod usage;

pub use content::{
    ContentBlock, StructuredToolUseResult, TextBlock, ThinkingBlock, ToolResultBlock, ToolUseBlock,
    ToolUseResult,
};
pub use events::{StreamDelta, StreamEvent};
pub use input::{
    PermissionInput, UserInput, UserInputContentBlock, UserInputKind, UserInputMessage,
};
pub use jsonrpc::{
    Implementation, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, ToolCallContent, ToolDefinition, ToolsCallParams, ToolsCallResult,
    ToolsListResult, JSONRPC_VERSION,
};
pub use messages::{
    AssistantMessage, AssistantPayload, McpServerStatus, Message, PermissionDenial, PluginInfo,
    RawLine, ResultMessage, StreamEventMessage, SystemMessage, UnknownMessage, UserMessage,
    UserPayload,
};
pub use usage::{ModelUsage, Usage};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Message>();
        assert_send_sync::<ContentBlock>();
        assert_send_sync::<StreamEvent>();
        assert_send_sync::<UserInput>();
        assert_send_sync::<JsonRpcResponse>();
        assert_send_sync::<Usage>();
    }
}

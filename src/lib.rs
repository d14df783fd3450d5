//! # claudekit
//!
//! Async Rust client for the Claude CLI's `stream-json` protocol.
//!
//! The CLI runs as a long-lived subprocess. Its stdout carries newline-delimited
//! chat records (system, assistant, user, result, stream events) interleaved
//! with JSON-RPC responses from the embedded MCP control channel. Its stdin
//! accepts prompts, permission decisions, tool results and JSON-RPC requests.
//!
//! - [`parser`] frames stdout into lines and decodes [`Message`]s
//! - [`engine`] runs a duplex [`ProtocolEngine`] over any reader/writer pair
//! - [`process`] spawns the CLI with the right flags
//! - [`ClaudeClient`] ties a process and an engine together
//!
//! ## Quick Start
//!
//! ```no_run
//! use claudekit::protocol::{PermissionInput, UserInput};
//! use claudekit::{CancellationToken, ClaudeClient, Message, Result};
//!
//! # async fn run() -> Result<()> {
//! let client = ClaudeClient::builder().include_partial_messages(true).spawn().await?;
//! let cancel = CancellationToken::new();
//!
//! client.send_user_input(&UserInput::prompt("Tell me about dogs\n"), &cancel).await?;
//! loop {
//!     match client.next_message(&cancel).await? {
//!         Message::StreamEvent(event) => {
//!             if let Some(text) = event.event.text_delta() {
//!                 print!("{text}");
//!             }
//!         }
//!         Message::Result(result) => {
//!             println!("\ncost: {:?}", result.total_cost_usd);
//!             break;
//!         }
//!         _ => {}
//!     }
//! }
//!
//! // Answering a permission prompt looks like this.
//! let allow = UserInput::permission(PermissionInput::allow("toolu_01"));
//! client.send_user_input(&allow, &cancel).await?;
//! client.close().await
//! # }
//! ```
//!
//! ## MCP control channel
//!
//! ```no_run
//! use claudekit::protocol::{Implementation, InitializeParams, ToolsCallParams};
//! use claudekit::{deadline_token, ClaudeClient, Result};
//! use std::time::Duration;
//!
//! # async fn run(client: &ClaudeClient) -> Result<()> {
//! let cancel = deadline_token(Duration::from_secs(30));
//! let init = InitializeParams::new(Implementation::new("my-app", "1.0.0"));
//! client.mcp_initialize(&init, &cancel).await?;
//! client.mcp_initialized(None, &cancel).await?;
//!
//! let tools = client.mcp_tools_list(&cancel).await?;
//! for tool in &tools.tools {
//!     println!("{}", tool.name);
//! }
//!
//! let call = ToolsCallParams::new("echo").arg("text", "hi");
//! println!("{}", client.mcp_tools_call(&call, &cancel).await?.text());
//! # Ok(())
//! # }
//! ```

mod client;
pub mod config;
pub mod engine;
mod error;
pub mod parser;
pub mod process;
pub mod protocol;

pub use error::{Error, InputError, Result};

pub use tokio_util::sync::CancellationToken;

// Re-export the main client types at crate root
pub use client::{ClaudeClient, ClientBuilder};
pub use engine::{deadline_token, with_timeout, ProtocolEngine};
pub use parser::{parse_line, MessageParser};

// Re-export commonly used config types at crate root
pub use config::{ClientConfig, ClientConfigBuilder, Model, PermissionMode, SessionId, StderrMode};

// Re-export commonly used protocol types at crate root
pub use protocol::{ContentBlock, Message, UserInput, UserInputKind, Usage};

// Re-export commonly used process types at crate root
pub use process::ClaudeProcess;

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    /// All major public types must be Send + Sync for use across async tasks.
    #[test]
    fn public_types_are_send_sync() {
        // Client and engine
        assert_send_sync::<ClaudeClient>();
        assert_send_sync::<ClientBuilder>();
        assert_send_sync::<ProtocolEngine>();
        assert_send_sync::<MessageParser<&'static [u8]>>();

        // Configuration types
        assert_send_sync::<ClientConfig>();
        assert_send_sync::<ClientConfigBuilder>();
        assert_send_sync::<Model>();
        assert_send_sync::<PermissionMode>();
        assert_send_sync::<SessionId>();

        // Protocol types
        assert_send_sync::<Message>();
        assert_send_sync::<ContentBlock>();
        assert_send_sync::<UserInput>();
        assert_send_sync::<Usage>();

        // Process types
        assert_send_sync::<ClaudeProcess>();

        // Error types
        assert_send_sync::<Error>();
        assert_send_sync::<InputError>();
    }
}

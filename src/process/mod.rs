//! Process management for the Claude CLI.
//!
//! One process serves one session. Prompts, permission decisions and MCP
//! requests go to stdin; stream-json records come back on stdout.
//!
//! # Architecture
//!
//! ```text
//! claudekit                            claude CLI
//! ┌──────────────┐                     ┌─────────────┐
//! │ClaudeProcess │───stdin (input)────▶│             │
//! │              │◀──stdout (JSON)─────│             │
//! │              │◀──stderr (logs)─────│             │
//! └──────────────┘                     └─────────────┘
//! ```
//!
//! Stderr is inherited, discarded or forwarded to `debug` events depending on
//! [`StderrMode`](crate::config::StderrMode).

mod io;
mod spawn;

pub use io::StderrReader;
pub use spawn::{build_args, ClaudeProcess};

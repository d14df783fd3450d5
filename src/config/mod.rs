//! Configuration for spawning the Claude CLI.
//!
//! - [`ClientConfig`] and [`ClientConfigBuilder`] collect the CLI flags and
//!   process options
//! - [`Model`], [`PermissionMode`], [`SessionId`] and [`StderrMode`] are the
//!   typed values behind them
//!
//! # Example
//!
//! ```
//! use claudekit::config::{ClientConfig, Model, PermissionMode};
//!
//! let config = ClientConfig::builder()
//!     .model(Model::Haiku)
//!     .max_turns(1)
//!     .permission_mode(PermissionMode::AcceptEdits)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.model(), Some(&Model::Haiku));
//! ```

pub mod builder;
pub mod options;

pub use builder::{ClientConfig, ClientConfigBuilder};
pub use options::{Model, PermissionMode, SessionId, StderrMode};

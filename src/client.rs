//! High-level client for a stream-json CLI session.
//!
//! [`ClaudeClient`] owns the CLI process (when it spawned one) and the
//! [`ProtocolEngine`] running over its pipes.
//!
//! # Example
//!
//! ```no_run
//! use claudekit::protocol::UserInput;
//! use claudekit::{CancellationToken, ClaudeClient, Model, Result};
//!
//! # async fn run() -> Result<()> {
//! let client = ClaudeClient::builder()
//!     .model(Model::Haiku)
//!     .max_turns(1)
//!     .spawn()
//!     .await?;
//!
//! let cancel = CancellationToken::new();
//! client.send_user_input(&UserInput::prompt("What is 2+2?\n"), &cancel).await?;
//! loop {
//!     let message = client.next_message(&cancel).await?;
//!     if let Some(result) = message.as_result() {
//!         println!("{}", result.result.as_deref().unwrap_or_default());
//!         break;
//!     }
//! }
//! client.close().await
//! # }
//! ```

use std::path::PathBuf;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::{ClientConfig, ClientConfigBuilder, Model, PermissionMode, SessionId, StderrMode};
use crate::engine::ProtocolEngine;
use crate::process::ClaudeProcess;
use crate::protocol::{
    InitializeParams, InitializeResult, Message, ToolsCallParams, ToolsCallResult, ToolsListResult,
    UserInput,
};
use crate::{Error, Result};

/// A duplex session with the Claude CLI.
///
/// `ClaudeClient` is `Send + Sync`; share it behind an `Arc` to read and
/// write from different tasks.
#[derive(Debug)]
pub struct ClaudeClient {
    engine: ProtocolEngine,
    process: Mutex<Option<ClaudeProcess>>,
    pid: Option<u32>,
}

impl ClaudeClient {
    /// Create a builder for spawning a new CLI process.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Spawn the CLI described by `config` and start an engine on its pipes.
    pub async fn spawn(config: &ClientConfig) -> Result<Self> {
        let mut process = ClaudeProcess::spawn(config)?;
        let stdin = process
            .take_stdin()
            .ok_or_else(|| Error::ProcessSpawn(std::io::Error::other("stdin was not piped")))?;
        let stdout = process
            .take_stdout()
            .ok_or_else(|| Error::ProcessSpawn(std::io::Error::other("stdout was not piped")))?;

        let pid = process.pid();
        Ok(Self {
            engine: ProtocolEngine::new(stdout, stdin),
            process: Mutex::new(Some(process)),
            pid,
        })
    }

    /// Run the protocol over arbitrary streams, without a process.
    ///
    /// Must be called inside a tokio runtime.
    pub fn from_streams<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            engine: ProtocolEngine::new(reader, writer),
            process: Mutex::new(None),
            pid: None,
        }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &ProtocolEngine {
        &self.engine
    }

    /// Process ID of the spawned CLI, if there is one.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_closed(&self) -> bool {
        self.engine.is_closed()
    }

    /// See [`ProtocolEngine::send_user_input`].
    pub async fn send_user_input(&self, input: &UserInput, cancel: &CancellationToken) -> Result<()> {
        self.engine.send_user_input(input, cancel).await
    }

    /// See [`ProtocolEngine::next_message`].
    pub async fn next_message(&self, cancel: &CancellationToken) -> Result<Message> {
        self.engine.next_message(cancel).await
    }

    /// See [`ProtocolEngine::mcp_initialize`].
    pub async fn mcp_initialize(
        &self,
        params: &InitializeParams,
        cancel: &CancellationToken,
    ) -> Result<InitializeResult> {
        self.engine.mcp_initialize(params, cancel).await
    }

    /// See [`ProtocolEngine::mcp_initialized`].
    pub async fn mcp_initialized(&self, params: Option<Value>, cancel: &CancellationToken) -> Result<()> {
        self.engine.mcp_initialized(params, cancel).await
    }

    /// See [`ProtocolEngine::mcp_tools_list`].
    pub async fn mcp_tools_list(&self, cancel: &CancellationToken) -> Result<ToolsListResult> {
        self.engine.mcp_tools_list(cancel).await
    }

    /// See [`ProtocolEngine::mcp_tools_call`].
    pub async fn mcp_tools_call(
        &self,
        params: &ToolsCallParams,
        cancel: &CancellationToken,
    ) -> Result<ToolsCallResult> {
        self.engine.mcp_tools_call(params, cancel).await
    }

    /// Close the session.
    ///
    /// Closes the engine, then kills and reaps the CLI process. Every step
    /// runs even if an earlier one fails; the first error is returned.
    /// Calling it again is a no-op.
    pub async fn close(&self) -> Result<()> {
        let mut first_err = self.engine.close().await.err();

        let process = self.process.lock().await.take();
        if let Some(mut process) = process {
            if let Err(e) = shutdown_process(&mut process).await {
                tracing::warn!(pid = ?process.pid(), error = %e, "failed to stop claude process");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

async fn shutdown_process(process: &mut ClaudeProcess) -> Result<()> {
    if process.is_running() {
        process.kill().await?;
    }
    let status = process.wait().await?;
    tracing::debug!(pid = ?process.pid(), %status, "claude process exited");
    Ok(())
}

/// Builder for [`ClaudeClient`].
///
/// This wraps [`ClientConfigBuilder`] and spawns directly into a
/// [`ClaudeClient`].
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    inner: ClientConfigBuilder,
}

impl ClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration without spawning anything.
    pub fn build_config(self) -> Result<ClientConfig> {
        self.inner.build()
    }

    /// Validate the configuration and spawn the CLI.
    pub async fn spawn(self) -> Result<ClaudeClient> {
        let config = self.inner.build()?;
        ClaudeClient::spawn(&config).await
    }

    // -------------------------------------------------------------------------
    // Model and limits
    // -------------------------------------------------------------------------

    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.inner = self.inner.model(model);
        self
    }

    pub fn max_turns(mut self, turns: u32) -> Self {
        self.inner = self.inner.max_turns(turns);
        self
    }

    pub fn max_budget_usd(mut self, budget: f64) -> Self {
        self.inner = self.inner.max_budget_usd(budget);
        self
    }

    // -------------------------------------------------------------------------
    // System prompts
    // -------------------------------------------------------------------------

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.inner = self.inner.system_prompt(prompt);
        self
    }

    pub fn append_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.inner = self.inner.append_system_prompt(prompt);
        self
    }

    // -------------------------------------------------------------------------
    // Tools and permissions
    // -------------------------------------------------------------------------

    pub fn allowed_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inner = self.inner.allowed_tools(tools);
        self
    }

    pub fn disallowed_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.inner = self.inner.disallowed_tools(tools);
        self
    }

    pub fn mcp_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner = self.inner.mcp_config(path);
        self
    }

    pub fn dangerously_skip_permissions(mut self, skip: bool) -> Self {
        self.inner = self.inner.dangerously_skip_permissions(skip);
        self
    }

    pub fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.inner = self.inner.permission_mode(mode);
        self
    }

    // -------------------------------------------------------------------------
    // Session options
    // -------------------------------------------------------------------------

    pub fn resume(mut self, id: impl Into<SessionId>) -> Self {
        self.inner = self.inner.resume(id);
        self
    }

    pub fn continue_session(mut self, cont: bool) -> Self {
        self.inner = self.inner.continue_session(cont);
        self
    }

    pub fn include_partial_messages(mut self, include: bool) -> Self {
        self.inner = self.inner.include_partial_messages(include);
        self
    }

    // -------------------------------------------------------------------------
    // Process options
    // -------------------------------------------------------------------------

    pub fn cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner = self.inner.cli_path(path);
        self
    }

    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner = self.inner.working_directory(path);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner = self.inner.env(key, value);
        self
    }

    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inner = self.inner.inherit_env(inherit);
        self
    }

    pub fn stderr(mut self, mode: StderrMode) -> Self {
        self.inner = self.inner.stderr(mode);
        self
    }
}

//! Client configuration and builder.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::options::{Model, PermissionMode, SessionId, StderrMode};
use crate::{Error, Result};

/// Everything needed to spawn a stream-json CLI process.
///
/// Use [`ClientConfig::builder()`] to create a new configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // Model and limits
    pub(crate) model: Option<Model>,
    pub(crate) max_turns: Option<u32>,
    pub(crate) max_budget_usd: Option<f64>,

    // System prompts
    pub(crate) system_prompt: Option<String>,
    pub(crate) append_system_prompt: Option<String>,

    // Tools and permissions
    pub(crate) allowed_tools: Vec<String>,
    pub(crate) disallowed_tools: Vec<String>,
    pub(crate) mcp_config: Option<PathBuf>,
    pub(crate) dangerously_skip_permissions: bool,
    pub(crate) permission_mode: PermissionMode,

    // Session options
    pub(crate) resume: Option<SessionId>,
    pub(crate) continue_session: bool,
    pub(crate) include_partial_messages: bool,

    // Process options
    pub(crate) cli_path: Option<PathBuf>,
    pub(crate) working_directory: Option<PathBuf>,
    pub(crate) env_vars: HashMap<String, String>,
    pub(crate) inherit_env: bool,
    pub(crate) stderr: StderrMode,
}

impl ClientConfig {
    /// Create a new builder for ClientConfig.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn max_turns(&self) -> Option<u32> {
        self.max_turns
    }

    pub fn permission_mode(&self) -> PermissionMode {
        self.permission_mode
    }

    pub fn resume(&self) -> Option<&SessionId> {
        self.resume.as_ref()
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn stderr(&self) -> StderrMode {
        self.stderr
    }

    /// The CLI binary, defaulting to `claude` on `PATH`.
    pub fn cli_command(&self) -> &Path {
        self.cli_path.as_deref().unwrap_or(Path::new("claude"))
    }
}

/// Builder for [`ClientConfig`].
///
/// Validation happens in [`build()`](ClientConfigBuilder::build).
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    model: Option<Model>,
    max_turns: Option<u32>,
    max_budget_usd: Option<f64>,
    system_prompt: Option<String>,
    append_system_prompt: Option<String>,
    allowed_tools: Vec<String>,
    disallowed_tools: Vec<String>,
    mcp_config: Option<PathBuf>,
    dangerously_skip_permissions: bool,
    permission_mode: PermissionMode,
    resume: Option<SessionId>,
    continue_session: bool,
    include_partial_messages: bool,
    cli_path: Option<PathBuf>,
    working_directory: Option<PathBuf>,
    env_vars: HashMap<String, String>,
    inherit_env: bool,
    stderr: StderrMode,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            model: None,
            max_turns: None,
            max_budget_usd: None,
            system_prompt: None,
            append_system_prompt: None,
            allowed_tools: Vec::new(),
            disallowed_tools: Vec::new(),
            mcp_config: None,
            dangerously_skip_permissions: false,
            permission_mode: PermissionMode::default(),
            resume: None,
            continue_session: false,
            include_partial_messages: false,
            cli_path: None,
            working_directory: None,
            env_vars: HashMap::new(),
            inherit_env: true,
            stderr: StderrMode::default(),
        }
    }
}

impl ClientConfigBuilder {
    // -------------------------------------------------------------------------
    // Model and limits
    // -------------------------------------------------------------------------

    /// Set the model to use.
    pub fn model(mut self, model: impl Into<Model>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Stop after this many agentic turns.
    pub fn max_turns(mut self, turns: u32) -> Self {
        self.max_turns = Some(turns);
        self
    }

    /// Set the maximum budget in USD.
    pub fn max_budget_usd(mut self, budget: f64) -> Self {
        self.max_budget_usd = Some(budget);
        self
    }

    // -------------------------------------------------------------------------
    // System prompts
    // -------------------------------------------------------------------------

    /// Set the system prompt (replaces default).
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Append to the system prompt (added after default).
    pub fn append_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.append_system_prompt = Some(prompt.into());
        self
    }

    // -------------------------------------------------------------------------
    // Tools and permissions
    // -------------------------------------------------------------------------

    /// Set allowed tools, joined with commas on the command line.
    pub fn allowed_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn disallowed_tools(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.disallowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Path to MCP configuration file.
    pub fn mcp_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.mcp_config = Some(path.into());
        self
    }

    pub fn dangerously_skip_permissions(mut self, skip: bool) -> Self {
        self.dangerously_skip_permissions = skip;
        self
    }

    pub fn permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = mode;
        self
    }

    // -------------------------------------------------------------------------
    // Session options
    // -------------------------------------------------------------------------

    /// Resume a specific session by ID.
    pub fn resume(mut self, id: impl Into<SessionId>) -> Self {
        self.resume = Some(id.into());
        self
    }

    /// Continue the most recent session.
    pub fn continue_session(mut self, cont: bool) -> Self {
        self.continue_session = cont;
        self
    }

    /// Emit `stream_event` records for partial messages.
    pub fn include_partial_messages(mut self, include: bool) -> Self {
        self.include_partial_messages = include;
        self
    }

    // -------------------------------------------------------------------------
    // Process options
    // -------------------------------------------------------------------------

    /// Path to claude CLI binary (default: search PATH for "claude").
    pub fn cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cli_path = Some(path.into());
        self
    }

    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(path.into());
        self
    }

    /// Add/override environment variable for subprocess.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Don't inherit parent environment (default: inherit).
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    pub fn stderr(mut self, mode: StderrMode) -> Self {
        self.stderr = mode;
        self
    }

    // -------------------------------------------------------------------------
    // Build
    // -------------------------------------------------------------------------

    /// Build the configuration.
    ///
    /// Rejects a non-positive budget, an empty CLI path and a working
    /// directory that does not exist. The CLI binary itself is looked up at
    /// spawn time.
    pub fn build(self) -> Result<ClientConfig> {
        if let Some(budget) = self.max_budget_usd {
            if budget.is_nan() || budget <= 0.0 {
                return Err(Error::InvalidConfig(
                    "max_budget_usd must be positive".into(),
                ));
            }
        }

        if let Some(ref path) = self.cli_path {
            if path.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("cli path is empty".into()));
            }
        }

        if let Some(ref dir) = self.working_directory {
            if !dir.exists() {
                return Err(Error::InvalidConfig(format!(
                    "working directory does not exist: {}",
                    dir.display()
                )));
            }
        }

        Ok(ClientConfig {
            model: self.model,
            max_turns: self.max_turns,
            max_budget_usd: self.max_budget_usd,
            system_prompt: self.system_prompt.filter(|s| !s.is_empty()),
            append_system_prompt: self.append_system_prompt.filter(|s| !s.is_empty()),
            allowed_tools: self.allowed_tools,
            disallowed_tools: self.disallowed_tools,
            mcp_config: self.mcp_config,
            dangerously_skip_permissions: self.dangerously_skip_permissions,
            permission_mode: self.permission_mode,
            resume: self.resume.filter(|id| !id.as_str().trim().is_empty()),
            continue_session: self.continue_session,
            include_partial_messages: self.include_partial_messages,
            cli_path: self.cli_path,
            working_directory: self.working_directory,
            env_vars: self.env_vars,
            inherit_env: self.inherit_env,
            stderr: self.stderr,
        })
    }
}

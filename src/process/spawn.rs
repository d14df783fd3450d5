//! Process spawning and lifecycle management.

use std::process::{ExitStatus, Stdio};

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use super::io::StderrReader;
use crate::config::{ClientConfig, PermissionMode, StderrMode};
use crate::{Error, Result};

/// A running Claude CLI process in stream-json mode.
///
/// Stdin and stdout are piped so they can be handed to a
/// [`ProtocolEngine`](crate::engine::ProtocolEngine). Dropping a
/// `ClaudeProcess` kills the subprocess if it's still running.
pub struct ClaudeProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for ClaudeProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeProcess")
            .field("pid", &self.child.id())
            .field("stdin_taken", &self.stdin.is_none())
            .field("stdout_taken", &self.stdout.is_none())
            .finish()
    }
}

impl ClaudeProcess {
    /// Spawn the CLI described by `config`.
    ///
    /// A binary that cannot be found maps to [`Error::CliNotFound`]; any other
    /// spawn failure is [`Error::ProcessSpawn`].
    pub fn spawn(config: &ClientConfig) -> Result<Self> {
        let mut cmd = build_command(config);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(match config.stderr {
            StderrMode::Inherit => Stdio::inherit(),
            StderrMode::Log => Stdio::piped(),
            StderrMode::Null => Stdio::null(),
        });
        cmd.kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::CliNotFound {
                    searched: config.cli_command().display().to_string(),
                }
            } else {
                Error::ProcessSpawn(e)
            }
        })?;

        let pid = child.id();
        tracing::debug!(pid = ?pid, cli = %config.cli_command().display(), "spawned claude process");

        let stderr_task = child
            .stderr
            .take()
            .map(|stderr| StderrReader::new(stderr).spawn_log_forwarder(pid));

        Ok(Self {
            stdin: child.stdin.take(),
            stdout: child.stdout.take(),
            child,
            stderr_task,
        })
    }

    /// Take the stdin pipe. Returns `None` after the first call.
    pub fn take_stdin(&mut self) -> Option<ChildStdin> {
        self.stdin.take()
    }

    /// Take the stdout pipe. Returns `None` after the first call.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Get the process ID of the running CLI.
    pub fn pid(&self) -> Option<u32> {
        self.child.id()
    }

    /// Check if the process is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    /// Wait for the process to exit and return its exit status.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        let status = self.child.wait().await.map_err(Error::io)?;
        if let Some(task) = self.stderr_task.take() {
            let _ = task.await;
        }
        Ok(status)
    }

    /// Kill the process and reap it.
    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await.map_err(Error::io)
    }

    /// Send a kill signal without waiting.
    pub fn start_kill(&mut self) -> Result<()> {
        self.child.start_kill().map_err(Error::io)
    }
}

impl Drop for ClaudeProcess {
    fn drop(&mut self) {
        let _ = self.start_kill();
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

/// Build a tokio Command from the config.
fn build_command(config: &ClientConfig) -> Command {
    let mut cmd = Command::new(config.cli_command());

    if let Some(ref dir) = config.working_directory {
        cmd.current_dir(dir);
    }

    if !config.inherit_env {
        cmd.env_clear();
    }
    cmd.envs(&config.env_vars);

    cmd.args(build_args(config));
    cmd
}

/// Build the CLI arguments for a stream-json session.
///
/// The fixed prefix is `--print --output-format stream-json --verbose`; the
/// optional flags follow in a stable order.
pub fn build_args(config: &ClientConfig) -> Vec<String> {
    let mut args: Vec<String> = ["--print", "--output-format", "stream-json", "--verbose"]
        .into_iter()
        .map(String::from)
        .collect();

    if let Some(ref model) = config.model {
        args.push("--model".to_string());
        args.push(model.to_string());
    }

    if let Some(turns) = config.max_turns {
        args.push("--max-turns".to_string());
        args.push(turns.to_string());
    }

    if let Some(budget) = config.max_budget_usd {
        args.push("--max-budget-usd".to_string());
        args.push(budget.to_string());
    }

    if let Some(ref prompt) = config.system_prompt {
        args.push("--system-prompt".to_string());
        args.push(prompt.clone());
    }

    if let Some(ref prompt) = config.append_system_prompt {
        args.push("--append-system-prompt".to_string());
        args.push(prompt.clone());
    }

    if !config.allowed_tools.is_empty() {
        args.push("--allowed-tools".to_string());
        args.push(config.allowed_tools.join(","));
    }

    if !config.disallowed_tools.is_empty() {
        args.push("--disallowed-tools".to_string());
        args.push(config.disallowed_tools.join(","));
    }

    if let Some(ref path) = config.mcp_config {
        args.push("--mcp-config".to_string());
        args.push(path.display().to_string());
    }

    if config.include_partial_messages {
        args.push("--include-partial-messages".to_string());
    }

    if config.dangerously_skip_permissions {
        args.push("--dangerously-skip-permissions".to_string());
    }

    if let Some(ref id) = config.resume {
        args.push("--resume".to_string());
        args.push(id.to_string());
    }

    if config.continue_session {
        args.push("--continue".to_string());
    }

    if config.permission_mode != PermissionMode::Default {
        args.push("--permission-mode".to_string());
        args.push(config.permission_mode.to_string());
    }

    args
}

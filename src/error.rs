use std::time::Duration;

/// Errors that can occur when driving the Claude CLI protocol.
///
/// Errors are organized by category:
/// - Configuration and spawn errors: detected before any I/O happens
/// - Stream errors: the read or write side is finished or broken
/// - Validation errors: a [`UserInput`](crate::protocol::UserInput) was rejected before writing
/// - RPC errors: the MCP peer answered with an error or an unexpected result
/// - Cancellation: the caller gave up on a pending operation
///
/// A record that has a known `type` but fails to decode is *not* an error; it
/// comes back as [`Message::Unknown`](crate::protocol::Message::Unknown) with
/// diagnostics attached.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    // -------------------------------------------------------------------------
    // Configuration errors (detected at build() time)
    // -------------------------------------------------------------------------
    /// Invalid configuration provided to builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // -------------------------------------------------------------------------
    // Spawn errors
    // -------------------------------------------------------------------------
    /// Claude CLI binary not found in PATH.
    #[error("claude CLI not found (searched: {searched})")]
    CliNotFound { searched: String },

    /// Failed to spawn the claude subprocess.
    #[error("failed to spawn claude process: {0}")]
    ProcessSpawn(#[source] std::io::Error),

    // -------------------------------------------------------------------------
    // Stream errors (terminal)
    // -------------------------------------------------------------------------
    /// The stream reached its end, or was closed locally.
    ///
    /// This is the normal way a session ends and is kept apart from [`Error::Io`]
    /// so callers can special-case it.
    #[error("stream closed")]
    StreamClosed,

    /// IO error reading from or writing to the CLI.
    #[error("IO error: {0}")]
    Io(#[source] std::io::Error),

    /// A line was not valid JSON at all.
    #[error("parse message envelope: {source}\nraw:\n{raw}")]
    MalformedLine {
        /// The offending line, pretty-printed when possible.
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    /// A line exceeded the parser's maximum line size.
    #[error("line exceeds maximum size of {limit} bytes")]
    LineTooLong { limit: usize },

    // -------------------------------------------------------------------------
    // Validation errors
    // -------------------------------------------------------------------------
    /// The user input was rejected before anything was written.
    #[error("invalid user input: {0}")]
    InvalidInput(#[from] InputError),

    /// A value could not be serialized for the wire.
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    // -------------------------------------------------------------------------
    // RPC errors
    // -------------------------------------------------------------------------
    /// The JSON-RPC peer answered with an error object.
    #[error("jsonrpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// The JSON-RPC result did not match the expected shape.
    #[error("decode {method} result: {source}")]
    RpcDecode {
        method: &'static str,
        #[source]
        source: serde_json::Error,
    },

    // -------------------------------------------------------------------------
    // Runtime errors
    // -------------------------------------------------------------------------
    /// Request exceeded the configured timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller's cancellation token fired.
    #[error("request cancelled")]
    Cancelled,
}

/// Reasons a [`UserInput`](crate::protocol::UserInput) fails validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InputError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("raw input is empty")]
    EmptyRaw,

    #[error("permission input is missing")]
    MissingPermission,

    #[error("unsupported permission decision: {0:?}")]
    InvalidDecision(String),

    #[error("user message is missing")]
    MissingMessage,

    #[error("user message has no content")]
    EmptyContent,

    #[error("unsupported user message role: {0:?}")]
    InvalidRole(String),

    #[error("content block {index} is missing tool_use_id")]
    MissingToolUseId { index: usize },

    #[error("unsupported user message content type: {0:?}")]
    InvalidBlockType(String),

    #[error("ambiguous input: {0} are all set")]
    Ambiguous(String),

    #[error("{kind} input must not set {field}")]
    Conflicting {
        kind: &'static str,
        field: &'static str,
    },
}

/// A specialized Result type for claudekit operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a malformed-line error, pretty-printing the line when it parses.
    pub fn malformed_line(source: serde_json::Error, line: &[u8]) -> Self {
        let raw = serde_json::from_slice::<serde_json::Value>(line)
            .ok()
            .and_then(|v| serde_json::to_string_pretty(&v).ok())
            .unwrap_or_else(|| String::from_utf8_lossy(line).into_owned());
        Self::MalformedLine { raw, source }
    }

    /// Create an IO error.
    pub fn io(source: std::io::Error) -> Self {
        Self::Io(source)
    }

    /// Check if this is the clean end-of-stream condition.
    pub fn is_stream_closed(&self) -> bool {
        matches!(self, Error::StreamClosed)
    }

    /// Check if the operation was cancelled or timed out.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled | Error::Timeout(_))
    }

    /// Check if this is a user input validation failure.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// Check if the error came from the JSON-RPC peer.
    pub fn is_rpc(&self) -> bool {
        matches!(self, Error::Rpc { .. } | Error::RpcDecode { .. })
    }

    /// Check if this error leaves the stream unusable.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::StreamClosed
                | Error::Io(_)
                | Error::MalformedLine { .. }
                | Error::LineTooLong { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

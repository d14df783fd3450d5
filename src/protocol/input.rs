//! Outbound user input records.

use serde::{Deserialize, Serialize};

use crate::error::{Error, InputError, Result};

/// Which payload a [`UserInput`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserInputKind {
    /// Opaque text, written byte-for-byte.
    Prompt,
    /// Pre-serialized text, written byte-for-byte.
    Raw,
    /// A permission decision record.
    Permission,
    /// A stream-json user message carrying tool results.
    User,
}

impl UserInputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserInputKind::Prompt => "prompt",
            UserInputKind::Raw => "raw",
            UserInputKind::Permission => "permission",
            UserInputKind::User => "user",
        }
    }

    fn field(&self) -> &'static str {
        match self {
            UserInputKind::User => "message",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for UserInputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permission decision sent back to the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInput {
    /// `allow` or `deny`.
    pub decision: String,
    #[serde(default)]
    pub tool_use_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl PermissionInput {
    pub const ALLOW: &'static str = "allow";
    pub const DENY: &'static str = "deny";

    /// Allow the given tool use.
    pub fn allow(tool_use_id: impl Into<String>) -> Self {
        Self {
            decision: Self::ALLOW.into(),
            tool_use_id: tool_use_id.into(),
            reason: None,
        }
    }

    /// Deny the given tool use.
    pub fn deny(tool_use_id: impl Into<String>) -> Self {
        Self {
            decision: Self::DENY.into(),
            tool_use_id: tool_use_id.into(),
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Chat message payload for [`UserInputKind::User`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInputMessage {
    /// Must be `user`; empty defaults to it.
    pub role: Option<String>,
    pub content: Vec<UserInputContentBlock>,
}

/// A `tool_result` block inside a [`UserInputMessage`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInputContentBlock {
    /// Must be `tool_result`; empty defaults to it.
    pub block_type: Option<String>,
    pub tool_use_id: String,
    pub content: String,
}

impl UserInputContentBlock {
    pub fn tool_result(tool_use_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            block_type: None,
            tool_use_id: tool_use_id.into(),
            content: content.into(),
        }
    }
}

/// A record the caller sends to the CLI's stdin.
///
/// The kind is either set explicitly or inferred from the single populated
/// payload field. Use the constructors for the common cases:
///
/// ```
/// use claudekit::protocol::{PermissionInput, UserInput};
///
/// let prompt = UserInput::prompt("What is 2 + 2?");
/// let decision = UserInput::permission(PermissionInput::allow("toolu_01"));
/// # let _ = (prompt, decision);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInput {
    pub kind: Option<UserInputKind>,
    pub prompt: Option<String>,
    pub raw: Option<String>,
    pub permission: Option<PermissionInput>,
    pub message: Option<UserInputMessage>,
    pub uuid: Option<String>,
    pub session_id: Option<String>,
    pub parent_tool_use_id: Option<String>,
}

#[derive(Serialize)]
struct UserRecord<'a> {
    #[serde(rename = "type")]
    record_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    uuid: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
    parent_tool_use_id: Option<&'a str>,
    message: UserRecordMessage<'a>,
}

#[derive(Serialize)]
struct UserRecordMessage<'a> {
    role: &'static str,
    content: Vec<UserRecordBlock<'a>>,
}

#[derive(Serialize)]
struct UserRecordBlock<'a> {
    #[serde(rename = "type")]
    block_type: &'static str,
    tool_use_id: &'a str,
    content: &'a str,
}

impl UserInput {
    /// Plain prompt text.
    pub fn prompt(text: impl Into<String>) -> Self {
        Self {
            kind: Some(UserInputKind::Prompt),
            prompt: Some(text.into()),
            ..Default::default()
        }
    }

    /// Pre-serialized text written as-is.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            kind: Some(UserInputKind::Raw),
            raw: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn permission(permission: PermissionInput) -> Self {
        Self {
            kind: Some(UserInputKind::Permission),
            permission: Some(permission),
            ..Default::default()
        }
    }

    /// A user message carrying tool results.
    pub fn user(content: Vec<UserInputContentBlock>) -> Self {
        Self {
            kind: Some(UserInputKind::User),
            message: Some(UserInputMessage {
                role: None,
                content,
            }),
            ..Default::default()
        }
    }

    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_parent_tool_use_id(mut self, id: impl Into<String>) -> Self {
        self.parent_tool_use_id = Some(id.into());
        self
    }

    fn populated(&self) -> Vec<UserInputKind> {
        let mut kinds = Vec::new();
        if self.prompt.is_some() {
            kinds.push(UserInputKind::Prompt);
        }
        if self.raw.is_some() {
            kinds.push(UserInputKind::Raw);
        }
        if self.permission.is_some() {
            kinds.push(UserInputKind::Permission);
        }
        if self.message.is_some() {
            kinds.push(UserInputKind::User);
        }
        kinds
    }

    /// Resolve the effective kind, rejecting ambiguous or conflicting fields.
    pub fn resolve_kind(&self) -> std::result::Result<UserInputKind, InputError> {
        let populated = self.populated();
        match self.kind {
            Some(kind) => {
                if let Some(other) = populated.iter().find(|k| **k != kind) {
                    return Err(InputError::Conflicting {
                        kind: kind.as_str(),
                        field: other.field(),
                    });
                }
                Ok(kind)
            }
            None => match populated.as_slice() {
                [] => Ok(UserInputKind::Prompt),
                [kind] => Ok(*kind),
                many => Err(InputError::Ambiguous(
                    many.iter().map(|k| k.field()).collect::<Vec<_>>().join(", "),
                )),
            },
        }
    }

    /// Validate and serialize into the exact text written to stdin.
    ///
    /// Prompt and raw text are returned unchanged. Permission and user
    /// records are JSON followed by a newline.
    pub fn encode(&self) -> Result<String> {
        match self.resolve_kind()? {
            UserInputKind::Prompt => {
                let prompt = self.prompt.as_deref().unwrap_or_default();
                if prompt.trim().is_empty() {
                    return Err(InputError::EmptyPrompt.into());
                }
                Ok(prompt.to_owned())
            }
            UserInputKind::Raw => match self.raw.as_deref() {
                Some(raw) if !raw.is_empty() => Ok(raw.to_owned()),
                _ => Err(InputError::EmptyRaw.into()),
            },
            UserInputKind::Permission => {
                let permission = self.permission.as_ref().ok_or(InputError::MissingPermission)?;
                if permission.decision != PermissionInput::ALLOW
                    && permission.decision != PermissionInput::DENY
                {
                    return Err(InputError::InvalidDecision(permission.decision.clone()).into());
                }
                encode_line(permission, "permission input")
            }
            UserInputKind::User => self.encode_user_record(),
        }
    }

    fn encode_user_record(&self) -> Result<String> {
        let message = self.message.as_ref().ok_or(InputError::MissingMessage)?;
        if message.content.is_empty() {
            return Err(InputError::EmptyContent.into());
        }
        match message.role.as_deref() {
            None | Some("") | Some("user") => {}
            Some(role) => return Err(InputError::InvalidRole(role.to_owned()).into()),
        }

        let mut content = Vec::with_capacity(message.content.len());
        for (index, block) in message.content.iter().enumerate() {
            match block.block_type.as_deref() {
                None | Some("") | Some("tool_result") => {}
                Some(other) => return Err(InputError::InvalidBlockType(other.to_owned()).into()),
            }
            if block.tool_use_id.trim().is_empty() {
                return Err(InputError::MissingToolUseId { index }.into());
            }
            content.push(UserRecordBlock {
                block_type: "tool_result",
                tool_use_id: &block.tool_use_id,
                content: &block.content,
            });
        }

        let record = UserRecord {
            record_type: "user",
            uuid: self.uuid.as_deref().filter(|s| !s.is_empty()),
            session_id: self.session_id.as_deref().filter(|s| !s.is_empty()),
            parent_tool_use_id: self.parent_tool_use_id.as_deref(),
            message: UserRecordMessage {
                role: "user",
                content,
            },
        };
        encode_line(&record, "user message")
    }
}

fn encode_line<T: Serialize>(value: &T, what: &'static str) -> Result<String> {
    let mut line = serde_json::to_string(value).map_err(|source| Error::Encode { what, source })?;
    line.push('\n');
    Ok(line)
}

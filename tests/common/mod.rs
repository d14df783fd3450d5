//! Test utilities for claudekit integration tests.

#![allow(dead_code)]

use claudekit::{ClaudeClient, ProtocolEngine};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

/// Records captured from a real CLI session.
pub mod golden {
    pub const SYSTEM_INIT: &str = r#"{"type":"system","subtype":"init","cwd":"/private/tmp/playing","session_id":"5620625c-b4c7-4185-9b2b-8de430dd2184","tools":["Task","TaskOutput","Bash","Glob","Grep","ExitPlanMode","Read","Edit","Write","NotebookEdit","WebFetch","TodoWrite","WebSearch","KillShell","AskUserQuestion","Skill","EnterPlanMode"],"mcp_servers":[{"name":"ruby-tools","status":"connected"}],"model":"claude-sonnet-4-5-20250929","permissionMode":"default","slash_commands":["compact","context","cost","init","pr-comments","release-notes","review","security-review"],"apiKeySource":"ANTHROPIC_API_KEY","claude_code_version":"2.1.3","output_style":"default","agents":["Bash","general-purpose","statusline-setup","Explore","Plan","claude-code-guide"],"skills":[],"plugins":[{"name":"gopls-lsp","path":"/Users/sam/.claude/plugins/cache/claude-plugins-official/gopls-lsp/1.0.0"}],"uuid":"95625b7e-3117-483b-95c9-47e54bb9ec70"}"#;

    pub const ASSISTANT_TOOL_USE: &str = r#"{"type":"assistant","message":{"model":"claude-sonnet-4-5-20250929","id":"msg_01Rf5Yc8FdberfJBxNjTNk3W","type":"message","role":"assistant","content":[{"type":"text","text":"I'll use the ruby-tools MCP server to get the current time and generate a random number."},{"type":"tool_use","id":"toolu_017K5vf","name":"mcp__ruby-tools__current_time","input":{}},{"type":"tool_use","id":"toolu_018ABC","name":"mcp__ruby-tools__random_number","input":{"min":1,"max":100}}],"stop_reason":null,"stop_sequence":null,"usage":{"input_tokens":2,"cache_creation_input_tokens":4722,"cache_read_input_tokens":13367,"cache_creation":{"ephemeral_5m_input_tokens":4722,"ephemeral_1h_input_tokens":0},"output_tokens":28,"service_tier":"standard"},"context_management":null},"parent_tool_use_id":null,"session_id":"5620625c-b4c7-4185-9b2b-8de430dd2184","uuid":"eda52225-597f-4a1f-8ca6-a6bcd94934ac"}"#;

    pub const USER_TOOL_RESULT: &str = r#"{"type":"user","message":{"role":"user","content":[{"tool_use_id":"toolu_01LsrzxpC42FnYPxepJfr9pg","type":"tool_result","content":"/private/tmp/playing/quick_start.rb\n/private/tmp/playing/advanced_examples.rb\n/private/tmp/playing/claude_agent_sdk_demo.rb"}]},"parent_tool_use_id":null,"session_id":"c8775347-af93-45c7-b9bf-a6e009483fa5","uuid":"4ffd3635-d0fb-4057-85e2-0f0a4c302fec","tool_use_result":{"filenames":["/private/tmp/playing/quick_start.rb","/private/tmp/playing/advanced_examples.rb","/private/tmp/playing/claude_agent_sdk_demo.rb"],"durationMs":345,"numFiles":3,"truncated":false}}"#;

    pub const USER_TEXT_RESULT: &str = r#"{"type":"user","message":{"role":"user","content":[{"tool_use_id":"toolu_01","type":"tool_result","content":"some text"}]},"session_id":"c8775347-af93-45c7-b9bf-a6e009483fa5","tool_use_result":"some text"}"#;

    pub const RESULT_SUCCESS: &str = r#"{"type":"result","subtype":"success","is_error":false,"duration_ms":7040,"duration_api_ms":12311,"num_turns":2,"result":"I found 3 Ruby files in the directory:\n\n1. `quick_start.rb`\n2. `advanced_examples.rb`\n3. `claude_agent_sdk_demo.rb`","session_id":"c8775347-af93-45c7-b9bf-a6e009483fa5","total_cost_usd":0.0186724,"usage":{"input_tokens":7,"cache_creation_input_tokens":440,"cache_read_input_tokens":35858,"output_tokens":114,"server_tool_use":{"web_search_requests":0,"web_fetch_requests":0},"service_tier":"standard","cache_creation":{"ephemeral_1h_input_tokens":0,"ephemeral_5m_input_tokens":440}},"modelUsage":{"claude-haiku-4-5-20251001":{"inputTokens":2,"outputTokens":170,"cacheReadInputTokens":10531,"cacheCreationInputTokens":0,"webSearchRequests":0,"costUSD":0.0019051,"contextWindow":200000,"maxOutputTokens":64000},"claude-sonnet-4-5-20250929":{"inputTokens":9,"outputTokens":143,"cacheReadInputTokens":39900,"cacheCreationInputTokens":439,"webSearchRequests":0,"costUSD":0.0157882,"contextWindow":200000,"maxOutputTokens":64000}},"permission_denials":[],"uuid":"34cf1a3e-8b9f-481e-ba6f-c9e934b09424"}"#;

    pub const STREAM_TEXT_DELTA: &str = r#"{"type":"stream_event","event":{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"Dogs are loyal"}},"session_id":"4a7c99c6-e08a-4e3c-b6ce-17c33ae8bb92","parent_tool_use_id":null,"uuid":"2bc3e3c8-d9f2-48e8-bd72-b828bbbf3732"}"#;
}

/// Builder for realistic NDJSON sessions.
pub struct ScenarioBuilder {
    lines: Vec<String>,
    session_id: String,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            session_id: "test-session-123".to_string(),
        }
    }

    pub fn session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = id.into();
        self
    }

    pub fn system_init(self) -> Self {
        let line = json!({
            "type": "system",
            "subtype": "init",
            "cwd": "/tmp",
            "session_id": self.session_id,
            "tools": ["Read", "Write", "Bash"],
            "model": "claude-sonnet-4-5-20250929",
            "permissionMode": "default",
        });
        self.push(line)
    }

    /// Stream `text` as a single delta followed by the full assistant message.
    pub fn text_response(self, text: &str) -> Self {
        let delta = json!({
            "type": "stream_event",
            "session_id": self.session_id,
            "event": {
                "type": "content_block_delta",
                "index": 0,
                "delta": {"type": "text_delta", "text": text},
            },
        });
        let assistant = json!({
            "type": "assistant",
            "session_id": self.session_id,
            "message": {
                "id": "msg_test",
                "role": "assistant",
                "content": [{"type": "text", "text": text}],
                "stop_reason": "end_turn",
            },
        });
        self.push(delta).push(assistant)
    }

    pub fn tool_use(self, id: &str, name: &str, input: Value) -> Self {
        let line = json!({
            "type": "assistant",
            "session_id": self.session_id,
            "message": {
                "role": "assistant",
                "content": [{"type": "tool_use", "id": id, "name": name, "input": input}],
                "stop_reason": "tool_use",
            },
        });
        self.push(line)
    }

    pub fn rpc_result(self, id: u64, result: Value) -> Self {
        self.push(json!({"jsonrpc": "2.0", "id": id, "result": result}))
    }

    pub fn rpc_error(self, id: u64, code: i64, message: &str) -> Self {
        self.push(json!({"jsonrpc": "2.0", "id": id, "error": {"code": code, "message": message}}))
    }

    pub fn success_result(self, result: &str) -> Self {
        let line = json!({
            "type": "result",
            "subtype": "success",
            "is_error": false,
            "duration_ms": 1200,
            "num_turns": 1,
            "result": result,
            "session_id": self.session_id,
            "total_cost_usd": 0.0042,
            "usage": {"input_tokens": 10, "output_tokens": 5},
        });
        self.push(line)
    }

    pub fn blank(mut self) -> Self {
        self.lines.push("   ".to_string());
        self
    }

    pub fn raw(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    pub fn build(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn push(mut self, value: Value) -> Self {
        self.lines.push(value.to_string());
        self
    }
}

/// The CLI's side of an in-memory session.
pub struct FakeCli {
    /// What the CLI prints.
    pub stdout: DuplexStream,
    /// What the client wrote, line by line.
    pub stdin: Lines<BufReader<DuplexStream>>,
}

impl FakeCli {
    pub async fn emit(&mut self, ndjson: &str) {
        self.stdout.write_all(ndjson.as_bytes()).await.unwrap();
    }

    pub async fn next_written(&mut self) -> Option<String> {
        self.stdin.next_line().await.unwrap()
    }

    pub async fn next_written_json(&mut self) -> Value {
        let line = self.next_written().await.expect("client wrote a line");
        serde_json::from_str(&line).unwrap()
    }
}

fn pipes() -> ((DuplexStream, DuplexStream), FakeCli) {
    let (client_read, cli_write) = tokio::io::duplex(64 * 1024);
    let (cli_read, client_write) = tokio::io::duplex(64 * 1024);
    let cli = FakeCli {
        stdout: cli_write,
        stdin: BufReader::new(cli_read).lines(),
    };
    ((client_read, client_write), cli)
}

pub fn engine() -> (ProtocolEngine, FakeCli) {
    let ((reader, writer), cli) = pipes();
    (ProtocolEngine::new(reader, writer), cli)
}

pub fn client() -> (ClaudeClient, FakeCli) {
    let ((reader, writer), cli) = pipes();
    (ClaudeClient::from_streams(reader, writer), cli)
}

//! JSON-RPC 2.0 envelopes and the MCP shapes carried over them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// A request, or a notification when `id` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub params: Value,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: Some(id),
            method: method.into(),
            params,
        }
    }

    pub fn notification(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: None,
            method: method.into(),
            params,
        }
    }

    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// True for a 2.0 response whose numeric id equals `id`.
    pub fn answers(&self, id: u64) -> bool {
        self.jsonrpc == JSONRPC_VERSION && self.id.as_u64() == Some(id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Name and version of an MCP client or server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Implementation {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl Implementation {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

/// Parameters for `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_version: Option<String>,
    pub client_info: Implementation,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub capabilities: BTreeMap<String, Value>,
}

impl InitializeParams {
    pub fn new(client_info: Implementation) -> Self {
        Self {
            client_info,
            ..Default::default()
        }
    }
}

/// Result of `initialize`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub server_info: Implementation,
    pub capabilities: BTreeMap<String, Value>,
}

/// Result of `tools/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDefinition>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema for the tool's arguments, kept verbatim.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub input_schema: Value,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsCallParams {
    pub name: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub arguments: BTreeMap<String, Value>,
}

impl ToolsCallParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    /// Add one argument.
    pub fn arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ToolsCallResult {
    pub content: Vec<ToolCallContent>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolsCallResult {
    /// Concatenated text of all `text` items.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolCallContent {
    #[serde(rename = "type")]
    pub content_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(1, "tools/list", json!({}));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value, json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list", "params": {}}));
    }

    #[test]
    fn notification_omits_id() {
        let req = JsonRpcRequest::notification("initialized", json!({}));
        assert!(req.is_notification());
        let text = serde_json::to_string(&req).unwrap();
        assert!(!text.contains("\"id\""));
        assert!(text.contains(r#""method":"initialized""#));
    }

    #[test]
    fn response_matching() {
        let resp: JsonRpcResponse =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":2,"result":{"tools":[]}}"#).unwrap();
        assert!(resp.answers(2));
        assert!(!resp.answers(1));

        let string_id: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":"2"}"#).unwrap();
        assert!(!string_id.answers(2));

        let old: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"1.0","id":2}"#).unwrap();
        assert!(!old.answers(2));
    }

    #[test]
    fn error_response() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
        )
        .unwrap();
        let err = resp.error.unwrap();
        assert_eq!(err.code, -32601);
        assert_eq!(err.message, "Method not found");
        assert!(err.data.is_none());
    }

    #[test]
    fn initialize_params_wire_names() {
        let params = InitializeParams::new(Implementation::new("claudekit", "dev"));
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value, json!({"clientInfo": {"name": "claudekit", "version": "dev"}}));
    }

    #[test]
    fn initialize_result() {
        let result: InitializeResult = serde_json::from_str(
            r#"{"protocolVersion":"2024-11-05","serverInfo":{"name":"test-server","version":"1.0.0"}}"#,
        )
        .unwrap();
        assert_eq!(result.protocol_version, "2024-11-05");
        assert_eq!(result.server_info.name, "test-server");
        assert!(result.capabilities.is_empty());
    }

    #[test]
    fn tools_list_and_call() {
        let list: ToolsListResult = serde_json::from_str(
            r#"{"tools":[{"name":"calculator","description":"calc","inputSchema":{"type":"object"}}]}"#,
        )
        .unwrap();
        assert_eq!(list.tools[0].name, "calculator");
        assert_eq!(list.tools[0].input_schema["type"], "object");

        let params = ToolsCallParams::new("calculator")
            .arg("operation", "multiply")
            .arg("a", 7)
            .arg("b", 6);
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(value["arguments"]["a"], 7);

        let call: ToolsCallResult =
            serde_json::from_str(r#"{"content":[{"type":"text","text":"42"}],"isError":false}"#).unwrap();
        assert_eq!(call.text(), "42");
        assert!(!call.is_error);
    }
}

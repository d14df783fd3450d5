//! Partial-message events carried inside `stream_event` records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::usage::Usage;

/// A streaming event from the Claude API.
///
/// These are the raw events wrapped in `stream_event` messages from the CLI
/// when `--include-partial-messages` is on. Only the six kinds below are
/// recognized; anything else fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Start of a new message.
    MessageStart {
        /// Partial message info, kept verbatim.
        #[serde(default)]
        message: Value,
    },
    /// Start of a content block.
    ContentBlockStart {
        /// Index of this block in the message.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        /// The content block being started, kept verbatim.
        #[serde(default)]
        content_block: Value,
    },
    /// Delta update to a content block.
    ContentBlockDelta {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
        delta: StreamDelta,
    },
    /// End of a content block.
    ContentBlockStop {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    /// Delta update to the message (e.g., stop reason).
    MessageDelta {
        #[serde(default)]
        delta: StreamDelta,
        /// Updated usage statistics.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },
    /// End of the message.
    MessageStop,
}

/// Delta payload shared by `content_block_delta` and `message_delta`.
///
/// The `type` names the delta kind (`text_delta`, `input_json_delta`,
/// `thinking_delta`); message deltas usually carry only `stop_reason`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamDelta {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub delta_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_json: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking: Option<String>,
}

impl StreamDelta {
    /// Get the text if this is a text delta.
    pub fn as_text(&self) -> Option<&str> {
        match self.delta_type.as_deref() {
            Some("text_delta") | None => self.text.as_deref(),
            _ => None,
        }
    }

    /// Get the partial JSON if this is an input_json_delta.
    pub fn as_input_json(&self) -> Option<&str> {
        self.partial_json.as_deref()
    }
}

impl StreamEvent {
    /// The wire `type` of this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::MessageStart { .. } => "message_start",
            StreamEvent::ContentBlockStart { .. } => "content_block_start",
            StreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            StreamEvent::ContentBlockStop { .. } => "content_block_stop",
            StreamEvent::MessageDelta { .. } => "message_delta",
            StreamEvent::MessageStop => "message_stop",
        }
    }

    /// Block index, for the three content block events.
    pub fn index(&self) -> Option<usize> {
        match self {
            StreamEvent::ContentBlockStart { index, .. }
            | StreamEvent::ContentBlockDelta { index, .. }
            | StreamEvent::ContentBlockStop { index } => *index,
            _ => None,
        }
    }

    /// Get the delta for `content_block_delta` and `message_delta` events.
    pub fn delta(&self) -> Option<&StreamDelta> {
        match self {
            StreamEvent::ContentBlockDelta { delta, .. } | StreamEvent::MessageDelta { delta, .. } => {
                Some(delta)
            }
            _ => None,
        }
    }

    /// Extract text from a text delta event.
    pub fn text_delta(&self) -> Option<&str> {
        match self {
            StreamEvent::ContentBlockDelta { delta, .. } => delta.as_text(),
            _ => None,
        }
    }

    /// Check if this is the end of the message.
    pub fn is_message_stop(&self) -> bool {
        matches!(self, StreamEvent::MessageStop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_message_start() {
        let json = r#"{
            "type": "message_start",
            "message": {"id": "msg_01234", "model": "claude-sonnet-4-5-20250929", "role": "assistant"}
        }"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type(), "message_start");
        match event {
            StreamEvent::MessageStart { message } => assert_eq!(message["id"], "msg_01234"),
            _ => panic!("Expected MessageStart"),
        }
    }

    #[test]
    fn parse_content_block_start_keeps_block_verbatim() {
        let json = r#"{
            "type": "content_block_start",
            "index": 1,
            "content_block": {"type": "tool_use", "id": "toolu_01234", "name": "Bash", "input": {}}
        }"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.index(), Some(1));
        match event {
            StreamEvent::ContentBlockStart { content_block, .. } => {
                assert_eq!(content_block["name"], "Bash");
            }
            _ => panic!("Expected ContentBlockStart"),
        }
    }

    #[test]
    fn parse_text_delta() {
        let json = r#"{
            "type": "content_block_delta",
            "index": 0,
            "delta": {"type": "text_delta", "text": "Dogs are loyal"}
        }"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.index(), Some(0));
        assert_eq!(event.text_delta(), Some("Dogs are loyal"));
        assert_eq!(
            event.delta().and_then(|d| d.delta_type.as_deref()),
            Some("text_delta")
        );
    }

    #[test]
    fn parse_input_json_delta() {
        let json = r#"{
            "type": "content_block_delta",
            "index": 1,
            "delta": {"type": "input_json_delta", "partial_json": "{\"command\":"}
        }"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        assert!(event.text_delta().is_none());
        assert_eq!(event.delta().unwrap().as_input_json(), Some("{\"command\":"));
    }

    #[test]
    fn parse_content_block_stop_without_index() {
        let event: StreamEvent = serde_json::from_str(r#"{"type": "content_block_stop"}"#).unwrap();
        assert_eq!(event, StreamEvent::ContentBlockStop { index: None });
    }

    #[test]
    fn parse_message_delta() {
        let json = r#"{
            "type": "message_delta",
            "delta": {"stop_reason": "end_turn"},
            "usage": {"output_tokens": 50}
        }"#;
        let event: StreamEvent = serde_json::from_str(json).unwrap();
        match event {
            StreamEvent::MessageDelta { delta, usage } => {
                assert_eq!(delta.stop_reason.as_deref(), Some("end_turn"));
                assert_eq!(usage.map(|u| u.output_tokens), Some(50));
            }
            _ => panic!("Expected MessageDelta"),
        }
    }

    #[test]
    fn parse_message_stop() {
        let event: StreamEvent = serde_json::from_str(r#"{"type": "message_stop"}"#).unwrap();
        assert!(event.is_message_stop());
        assert!(event.index().is_none());
    }

    #[test]
    fn unknown_event_kind_is_rejected() {
        assert!(serde_json::from_str::<StreamEvent>(r#"{"type": "ping"}"#).is_err());
        assert!(serde_json::from_str::<StreamEvent>(r#"{"type": "brand_new"}"#).is_err());
    }
}

//! Raw message shapes produced by the agent subprocess.
//!
//! The subprocess speaks newline-delimited JSON on stdout. Each line is one
//! of the variants below, discriminated by a `type` field — mirroring the
//! polymorphic `StreamEvent` / `AssistantMessage` / `UserMessage` /
//! `SystemMessage` / `ResultMessage` union the upstream agent SDK emits.
//! [`crate::client::AgentClient`] only parses this shape; turning it into
//! domain events is `conclave-events`'s job.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One message read from the subprocess's stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawMessage {
    /// An incremental streaming update from the underlying model API.
    StreamEvent(StreamEvent),
    /// A complete assistant turn, with all content blocks populated.
    #[serde(rename = "assistant")]
    AssistantMessage(AssistantMessage),
    /// User-authored input echoed back by the subprocess.
    #[serde(rename = "user")]
    UserMessage(UserMessage),
    /// Subprocess lifecycle/system information (e.g. the init handshake).
    #[serde(rename = "system")]
    SystemMessage(SystemMessage),
    /// Terminal result summary for a query.
    #[serde(rename = "result")]
    ResultMessage(ResultMessage),
}

impl RawMessage {
    /// The session id this message reports, if any.
    ///
    /// `StreamEvent` carries it directly; other variants never do. Used to
    /// capture the subprocess's external session id on the first message of
    /// a connection, per the Client Manager's session-id capture contract.
    #[must_use]
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Self::StreamEvent(e) => e.session_id.as_deref(),
            _ => None,
        }
    }
}

/// An incremental streaming update. `event` is the raw Anthropic-API-shaped
/// stream event (`message_start`, `content_block_delta`, ...); it is kept as
/// an untyped [`Value`] here and destructured by `conclave-events`, matching
/// how the upstream SDK leaves it loosely typed too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamEvent {
    /// External session id, present on at least the first event of a stream.
    pub session_id: Option<String>,
    /// The raw stream event payload.
    pub event: Value,
}

/// A complete assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AssistantMessage {
    /// Content blocks making up this turn.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// Set if the subprocess reports an error for this turn.
    #[serde(default)]
    pub error: Option<String>,
}

/// User input, echoed back for session transcript purposes. Not converted
/// into domain events — see `conclave-events`'s mapping table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessage {
    /// Free-form content, typically a string or a content-block list.
    pub content: Value,
}

/// Subprocess lifecycle/system information.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SystemMessage {
    /// System message subtype, e.g. `"init"`.
    #[serde(default)]
    pub subtype: Option<String>,
}

/// Terminal result summary for a completed query.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResultMessage {
    /// Result subtype.
    #[serde(default)]
    pub subtype: Option<String>,
    /// Whether the query ended in an error.
    #[serde(default)]
    pub is_error: bool,
}

/// One content block within an [`AssistantMessage`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Plain text. Skipped by the Event Converter — already streamed via
    /// `content_block_delta` before the complete message arrives.
    Text {
        /// The text content.
        text: String,
    },
    /// A tool invocation request, with complete (non-streamed) input.
    ToolUse {
        /// Tool-call id, correlated with a later `ToolResult`.
        id: String,
        /// Tool name.
        name: String,
        /// Tool arguments.
        #[serde(default)]
        input: Value,
    },
    /// The result of a previously issued tool call.
    ToolResult {
        /// The `id` of the `ToolUse` block this result answers.
        tool_use_id: String,
        /// Result payload, if any.
        #[serde(default)]
        content: Option<Value>,
        /// Whether the tool call failed.
        #[serde(default)]
        is_error: bool,
    },
    /// Internal reasoning. Not surfaced to the UI.
    Thinking {
        /// Reasoning text.
        thinking: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_event_round_trips() {
        let json = serde_json::json!({
            "type": "stream_event",
            "session_id": "abc-123",
            "event": {"type": "message_start"},
        });
        let parsed: RawMessage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.session_id(), Some("abc-123"));
        assert!(matches!(parsed, RawMessage::StreamEvent(_)));
    }

    #[test]
    fn assistant_message_with_tool_use_parses() {
        let json = serde_json::json!({
            "type": "assistant",
            "content": [
                {"type": "text", "text": "hello"},
                {"type": "tool_use", "id": "t1", "name": "show_file", "input": {"path": "a.rs"}},
            ],
        });
        let parsed: RawMessage = serde_json::from_value(json).unwrap();
        let RawMessage::AssistantMessage(msg) = parsed else {
            panic!("expected AssistantMessage");
        };
        assert_eq!(msg.content.len(), 2);
        assert!(matches!(msg.content[0], ContentBlock::Text { .. }));
        assert!(matches!(msg.content[1], ContentBlock::ToolUse { .. }));
        assert!(msg.error.is_none());
    }

    #[test]
    fn result_message_defaults_is_error_to_false() {
        let json = serde_json::json!({"type": "result", "subtype": "success"});
        let parsed: RawMessage = serde_json::from_value(json).unwrap();
        let RawMessage::ResultMessage(msg) = parsed else {
            panic!("expected ResultMessage");
        };
        assert!(!msg.is_error);
    }

    #[test]
    fn non_stream_event_has_no_session_id() {
        let json = serde_json::json!({"type": "system", "subtype": "init"});
        let parsed: RawMessage = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.session_id(), None);
    }
}

//! The closed set of domain events produced by the Event Converter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribution carried alongside a `ToolUse` event, identifying which agent
/// issued the call and which response it belongs to (for grouping parallel
/// tool calls under one assistant turn).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    /// Groups tool calls produced by the same assistant turn.
    pub response_id: Option<String>,
    /// The agent that issued the call.
    pub agent_id: Option<String>,
    /// Display name of the agent, for UI attribution.
    pub agent_name: Option<String>,
}

/// A domain-level event, independent of any particular LLM wire format.
///
/// This is the closed set the Event Converter maps raw subprocess messages
/// onto; the SSE Broadcast and Session Executor consume it exclusively —
/// neither ever sees a [`conclave_llm::RawMessage`] directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A new assistant turn has begun; defensively clears all text buffers.
    MessageStart,
    /// An incremental text update for the content block at `content_index`.
    StreamDelta {
        /// Index of the content block this delta belongs to.
        content_index: u64,
        /// The incremental text.
        text: String,
    },
    /// The content block at `content_index` has finished; its buffered text
    /// should be flushed into a persisted message.
    ContentBlockStop {
        /// Index of the completed content block.
        content_index: u64,
    },
    /// A tool invocation request, with complete (non-streamed) input.
    ToolUse {
        /// Tool-call id, correlated with a later `ToolComplete`.
        id: String,
        /// Tool name.
        name: String,
        /// Tool arguments.
        input: Value,
        /// Attribution for this call.
        #[serde(flatten)]
        attribution: Attribution,
    },
    /// The result of a previously issued tool call.
    ToolComplete {
        /// The `id` of the `ToolUse` this result answers.
        tool_use_id: String,
        /// Stringified result payload, if any.
        result: Option<String>,
        /// Whether the tool call failed.
        is_error: bool,
    },
    /// The assistant turn has ended (`stop_reason == "end_turn"`); any
    /// remaining text buffers should be flushed and the session returned
    /// to `idle`.
    MessageComplete,
    /// The subprocess reported an error for this turn.
    Error {
        /// Human-readable error message.
        message: String,
        /// Error classification, if the subprocess provided one.
        error_type: Option<String>,
    },
    /// User-authored input, passed through for UI transcript purposes.
    /// Never produced by [`crate::convert`] — the Session Executor emits
    /// this directly when enqueuing an incoming message.
    UserMessage {
        /// The message content.
        content: Value,
    },
}

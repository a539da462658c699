//! Persisted entity shapes: `Session`, `Project`, `Message`, `ActivityLogEntry`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use conclave_core::{AgentId, ProjectId, SessionId, SessionStatus, SessionType};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A session row.
///
/// Mirrors the Session Store's data model: the executor, builder, and
/// client manager all operate on this shape, never on a partial view of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier.
    pub id: SessionId,
    /// The agent definition driving this session, if any.
    pub agent_id: Option<AgentId>,
    /// The project this session belongs to. Required when `session_type == pm`.
    pub project_id: Option<ProjectId>,
    /// The session's archetypal role.
    pub session_type: SessionType,
    /// Current lifecycle status.
    pub status: SessionStatus,
    /// Resume token reported by the LLM subprocess, set after its first init event.
    pub external_session_id: Option<String>,
    /// Free-form context map. The `kanban_stage` key is reserved and
    /// maintained exclusively by the executor.
    pub context: HashMap<String, Value>,
    /// Reason for the last `error` transition, if any.
    pub error_message: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete tombstone. Once set, no further transitions are permitted.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Session {
    /// The session's kanban stage, read from `context.kanban_stage` if
    /// present, else recomputed from `status` (the two must always agree;
    /// this fallback only matters before the first executor sync).
    #[must_use]
    pub fn kanban_stage(&self) -> conclave_core::KanbanStage {
        self.status.kanban_stage()
    }

    /// `true` if this session has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A project row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Opaque project identifier.
    pub id: ProjectId,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Absolute filesystem path to the project's working directory.
    pub path: String,
    /// The agent assigned as PM, if any. Set/cleared together with `pm_session_id`.
    pub pm_agent_id: Option<AgentId>,
    /// The PM session, if any. Set/cleared together with `pm_agent_id`.
    pub pm_session_id: Option<SessionId>,
    /// Specialist agent ids on the team, resolved against the Agent Repository.
    pub team_member_ids: Vec<AgentId>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modified timestamp.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete tombstone.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Project {
    /// `true` if `pm_agent_id` and `pm_session_id` agree on presence, per
    /// the project invariant (both set, or both null).
    #[must_use]
    pub fn pm_assignment_is_consistent(&self) -> bool {
        self.pm_agent_id.is_some() == self.pm_session_id.is_some()
    }
}

/// The role of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// A user (or attributed cross-session) message.
    User,
    /// A full assistant text response.
    Assistant,
    /// A tool invocation made by the assistant.
    ToolCall,
    /// The result of a tool invocation.
    ToolResult,
    /// A system-authored message.
    System,
}

/// A message row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Opaque message identifier.
    pub id: conclave_core::MessageId,
    /// The session this message is persisted against.
    pub session_id: SessionId,
    /// Message role.
    pub role: MessageRole,
    /// Message body. For `tool_call` this is the serialized tool input; for
    /// `tool_result` the serialized tool output.
    pub content: String,
    /// Correlates a `tool_result` back to its `tool_call`.
    pub tool_use_id: Option<String>,
    /// Present for forward compatibility only; ordering is always by
    /// `created_at`. Always written as `0`.
    pub sequence: i64,
    /// Free-form metadata (e.g. SSE `response_id`).
    pub metadata: HashMap<String, Value>,
    /// Sender attribution: agent id, when the sender differs from the session's own agent.
    pub agent_id: Option<AgentId>,
    /// Sender attribution: display name (e.g. `"Pm"`, `"System Reminder"`).
    pub agent_name: Option<String>,
    /// The originating session, when this message was enqueued by another session.
    pub from_instance_id: Option<SessionId>,
    /// UI grouping token correlating streamed deltas to their final message.
    pub response_id: Option<String>,
    /// Creation timestamp; the sole ordering key.
    pub created_at: DateTime<Utc>,
}

/// An append-only activity log entry.
///
/// Used for session lifecycle events (`session.working`, `session.idle`,
/// `session.error`) and message persistence events, independent of the SSE
/// broadcast (which is ephemeral and has no subscribers-required listener).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    /// Opaque log entry identifier.
    pub id: uuid::Uuid,
    /// The session this entry concerns, if any.
    pub session_id: Option<SessionId>,
    /// The project this entry concerns, if any.
    pub project_id: Option<ProjectId>,
    /// The action name (e.g. `"session.working"`, `"message.persisted"`).
    pub action: String,
    /// Structured detail payload.
    pub detail: Value,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

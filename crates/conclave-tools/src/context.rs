//! Explicit call context.
//!
//! The original MCP servers pulled the calling session's identity out of a
//! thread-local (`get_current_session_info()`), set by the executor before
//! dispatch and cleared after. That couples every tool to a global and makes
//! concurrent sessions on a shared runtime fragile to get right. Here the
//! same information is passed explicitly: the executor builds a
//! [`RequestContext`] once per tool call and hands it to
//! [`crate::InstanceTool::execute`] as an ordinary argument.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use conclave_core::{AgentId, ProjectId, SessionId, SessionType};
use conclave_repos::{AgentRepository, SkillRepository};
use conclave_storage::{ProjectRepository, SessionRepository};
use futures::future::BoxFuture;

use crate::error::ToolError;

/// Everything a tool needs to know about who is calling it, resolved by the
/// executor before dispatch from the caller's own session row.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The session invoking the tool.
    pub caller_session_id: SessionId,
    /// The caller's project, if it has one.
    pub caller_project_id: Option<ProjectId>,
    /// The caller's own agent definition, if any.
    pub caller_agent_id: Option<AgentId>,
    /// The caller's session type (gates PM-only tools).
    pub caller_session_type: SessionType,
    /// Display name used for sender attribution on messages this call enqueues.
    pub caller_display_name: String,
    /// The caller's working directory, for `common` file-ops tools.
    pub workspace_root: PathBuf,
}

impl RequestContext {
    /// The caller's project id, or [`ToolError::MissingCallerProject`].
    pub fn require_project(&self) -> Result<ProjectId, ToolError> {
        self.caller_project_id.ok_or(ToolError::MissingCallerProject)
    }

    /// Reject the call unless the caller is a `pm` session.
    pub fn require_pm(&self) -> Result<(), ToolError> {
        if self.caller_session_type == SessionType::Pm {
            Ok(())
        } else {
            Err(ToolError::PmOnly)
        }
    }
}

/// Enqueues a message into a session's processor, the one entry point every
/// inter-session tool uses to actually deliver cross-session messages.
///
/// Implemented by `conclave_runtime::SessionExecutor`; kept as a trait here
/// so `conclave-tools` need not depend on `conclave-runtime` (which depends
/// on `conclave-tools` to dispatch tool calls in the first place).
#[async_trait]
pub trait SessionEnqueuer: Send + Sync {
    /// Persist `content` against `session_id` with the given sender
    /// attribution and start its processor if one is not already running.
    async fn enqueue(
        &self,
        session_id: SessionId,
        content: String,
        sender_agent_id: Option<AgentId>,
        sender_name: Option<String>,
        from_instance_id: Option<SessionId>,
    ) -> Result<(), ToolError>;
}

/// Runs a detached future, the way `remind`'s delayed self-reminder does.
///
/// Kept as a trait (rather than calling `tokio::spawn` directly from
/// `conclave-tools`) so whatever owns the runtime can track the returned
/// task weakly and cancel it on shutdown, per the "fire-and-forget tasks"
/// design note — `conclave-tools` itself has no shutdown sequence to hook
/// into.
pub trait BackgroundSpawner: Send + Sync {
    /// Spawn `future` to run independently of the caller.
    fn spawn(&self, future: BoxFuture<'static, ()>);
}

/// A [`BackgroundSpawner`] that hands the future straight to `tokio::spawn`
/// with no tracking at all. Adequate for a single-process runtime with no
/// graceful-shutdown requirement; `conclave-runtime` may swap in one backed
/// by a `JoinSet` instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioBackgroundSpawner;

impl BackgroundSpawner for TokioBackgroundSpawner {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        tokio::spawn(future);
    }
}

/// Shared, call-independent dependencies every tool may reach for.
pub struct ToolContext {
    /// Session rows.
    pub sessions: Arc<dyn SessionRepository>,
    /// Project rows.
    pub projects: Arc<dyn ProjectRepository>,
    /// Agent definitions.
    pub agents: Arc<dyn AgentRepository>,
    /// Skill definitions.
    pub skills: Arc<dyn SkillRepository>,
    /// The session executor's message-delivery entry point.
    pub enqueuer: Arc<dyn SessionEnqueuer>,
    /// Runs `remind`'s delayed callback detached from the calling turn.
    pub background: Arc<dyn BackgroundSpawner>,
}

impl ToolContext {
    /// Assemble a tool context from its constituent services.
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        projects: Arc<dyn ProjectRepository>,
        agents: Arc<dyn AgentRepository>,
        skills: Arc<dyn SkillRepository>,
        enqueuer: Arc<dyn SessionEnqueuer>,
        background: Arc<dyn BackgroundSpawner>,
    ) -> Self {
        Self { sessions, projects, agents, skills, enqueuer, background }
    }
}

//! Runtime-level error type, composing every lower layer's error via `#[from]`
//! the way `astrid_runtime::error::RuntimeError` composes `astrid-llm`,
//! `astrid-mcp`, `astrid-audit` and `astrid-capabilities`.

use std::time::Duration;

use conclave_core::{CoreError, ProjectId, SessionId};
use conclave_hooks::HookError;
use conclave_llm::ClientError;
use conclave_repos::RepoError;
use conclave_storage::StorageError;
use conclave_tools::ToolError;
use thiserror::Error;

/// Errors surfaced by the Session Builder, Client Manager, Session Executor
/// and Project Overlay.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// No session with this id exists (or it has been soft-deleted).
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// No project with this id exists.
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),

    /// No live client is registered for this session.
    #[error("no client registered for session {0}")]
    ClientNotFound(SessionId),

    /// A session-lifecycle transition was rejected by the state machine.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A repository call against `conclave-storage` failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A repository call against `conclave-repos` failed.
    #[error(transparent)]
    Repo(#[from] RepoError),

    /// The agent client failed to connect, stream, or disconnect.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// An in-process tool call failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// A `PreToolUse` hook could not be applied.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// The agent produced no output for longer than the configured inactivity window.
    #[error("session {0} timed out waiting for agent output after {1:?}")]
    StreamTimeout(SessionId, Duration),

    /// A caller-supplied argument was invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested operation is not valid for the session's current status.
    #[error("session {0} is not in a state that allows this operation")]
    InvalidState(SessionId),

    /// A filesystem operation (writing `PROJECT.md`, creating a project directory) failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout `conclave-runtime`.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

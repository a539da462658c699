//! Tool execution errors.
//!
//! A tool's `execute` propagates one of these with `?`; the registry
//! catches it at the dispatch boundary and turns it into the
//! `"✗ Error: ..."` wire payload rather than a protocol-level failure —
//! mirroring the original MCP servers' blanket `except Exception` / `_error`
//! pattern, but with the catch confined to one place instead of repeated in
//! every tool function.

use conclave_core::{ProjectId, SessionId};

/// Errors raised while validating or executing an inter-session tool call.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A required argument was missing or of the wrong type.
    #[error("{0} is required")]
    MissingArgument(&'static str),

    /// An argument's value failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    /// The referenced session does not exist.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),

    /// The referenced project does not exist.
    #[error("project {0} not found")]
    ProjectNotFound(ProjectId),

    /// The referenced agent definition does not exist.
    #[error("agent '{0}' not found. Available agents: {1}")]
    AgentNotFound(String, String),

    /// A tool only callable from a `pm` session was invoked from another type.
    #[error("this tool may only be called by a pm session")]
    PmOnly,

    /// `contact_instance`/`contact_pm` targeted a session outside the caller's project.
    #[error("target instance {0} is not in project {1}")]
    CrossProject(SessionId, ProjectId),

    /// The caller's own session identity could not be resolved from the request context.
    #[error("could not determine calling session from context")]
    MissingCallerContext,

    /// The caller has no project affiliation, but one was required.
    #[error("could not determine project from context")]
    MissingCallerProject,

    /// No non-deleted `pm` session exists in the caller's project.
    #[error("no pm session found for this project")]
    NoPmForProject,

    /// A lower-layer storage operation failed.
    #[error(transparent)]
    Storage(#[from] conclave_storage::StorageError),

    /// A lower-layer repository (agent/skill) operation failed.
    #[error(transparent)]
    Repo(#[from] conclave_repos::RepoError),

    /// An I/O error occurred (common tools' filesystem access).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A path argument resolved outside the permitted workspace root.
    #[error("path escapes workspace root: {0}")]
    PathTraversal(String),
}

/// Result of validating and running a tool's body.
pub type ToolResult = Result<crate::output::ToolOutput, ToolError>;

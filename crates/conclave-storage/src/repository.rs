//! Repository traits over the Session Store.
//!
//! Each trait is implemented once, against `SurrealDB`, in [`crate::surreal`].
//! Kept as traits (rather than inherent methods on [`crate::Database`]) so
//! the executor and tools in `conclave-runtime`/`conclave-tools` can be
//! written against `Arc<dyn SessionRepository>` and exercised with fakes in
//! tests without standing up a real database.

use async_trait::async_trait;
use conclave_core::{ProjectId, SessionId};

use crate::entities::{ActivityLogEntry, Message, Project, Session};
use crate::error::StorageResult;

/// CRUD + lifecycle access to [`Session`] rows.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a new session row.
    async fn create(&self, session: Session) -> StorageResult<Session>;

    /// Fetch a session by id. Returns `NotFound` for unknown or tombstoned ids.
    async fn get(&self, id: SessionId) -> StorageResult<Session>;

    /// Persist an in-place update (status, context, error_message, ...).
    async fn update(&self, session: Session) -> StorageResult<Session>;

    /// List non-deleted sessions, optionally scoped to a project.
    async fn list(&self, project_id: Option<ProjectId>) -> StorageResult<Vec<Session>>;

    /// Set `deleted_at` on the given session (tombstone, not a row delete).
    async fn soft_delete(&self, id: SessionId) -> StorageResult<()>;
}

/// CRUD access to [`Project`] rows.
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Insert a new project row.
    async fn create(&self, project: Project) -> StorageResult<Project>;

    /// Fetch a project by id. Returns `NotFound` for unknown or tombstoned ids.
    async fn get(&self, id: ProjectId) -> StorageResult<Project>;

    /// Persist an in-place update (pm assignment, team members, ...).
    async fn update(&self, project: Project) -> StorageResult<Project>;

    /// List non-deleted projects.
    async fn list(&self) -> StorageResult<Vec<Project>>;

    /// Set `deleted_at` on the given project.
    async fn soft_delete(&self, id: ProjectId) -> StorageResult<()>;
}

/// Append-only access to [`Message`] rows.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message.
    async fn create(&self, message: Message) -> StorageResult<Message>;

    /// List a session's messages in persistence order (`created_at` ascending).
    async fn list_for_session(&self, session_id: SessionId) -> StorageResult<Vec<Message>>;

    /// Delete every message for a session (used by `recreate`).
    async fn delete_for_session(&self, session_id: SessionId) -> StorageResult<()>;
}

/// Append-only access to [`ActivityLogEntry`] rows.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Append a new entry.
    async fn append(&self, entry: ActivityLogEntry) -> StorageResult<ActivityLogEntry>;

    /// List entries for a session in chronological order.
    async fn list_for_session(&self, session_id: SessionId) -> StorageResult<Vec<ActivityLogEntry>>;
}

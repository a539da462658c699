//! `SurrealDB`-backed implementations of the repository traits.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use conclave_core::{ProjectId, SessionId};
use tracing::instrument;

use crate::db::Database;
use crate::entities::{ActivityLogEntry, Message, Project, Session};
use crate::error::{StorageError, StorageResult};
use crate::repository::{ActivityLogRepository, MessageRepository, ProjectRepository, SessionRepository};

const SESSION_TABLE: &str = "session";
const PROJECT_TABLE: &str = "project";
const MESSAGE_TABLE: &str = "message";
const ACTIVITY_LOG_TABLE: &str = "activity_log";

/// `SurrealDB`-backed [`SessionRepository`].
#[derive(Clone)]
pub struct SurrealSessionRepository {
    db: Arc<Database>,
}

impl SurrealSessionRepository {
    /// Wrap a shared database handle.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionRepository for SurrealSessionRepository {
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn create(&self, session: Session) -> StorageResult<Session> {
        let created: Option<Session> = self
            .db
            .client()
            .create((SESSION_TABLE, session.id.to_string()))
            .content(session)
            .await?;
        created.ok_or_else(|| StorageError::Internal("session create returned no row".into()))
    }

    #[instrument(skip(self))]
    async fn get(&self, id: SessionId) -> StorageResult<Session> {
        let found: Option<Session> = self
            .db
            .client()
            .select((SESSION_TABLE, id.to_string()))
            .await?;
        match found {
            Some(s) if s.is_deleted() => Err(StorageError::Deleted(id.to_string())),
            Some(s) => Ok(s),
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    #[instrument(skip(self, session), fields(session_id = %session.id))]
    async fn update(&self, mut session: Session) -> StorageResult<Session> {
        session.updated_at = Utc::now();
        let updated: Option<Session> = self
            .db
            .client()
            .update((SESSION_TABLE, session.id.to_string()))
            .content(session.clone())
            .await?;
        updated.ok_or_else(|| StorageError::NotFound(session.id.to_string()))
    }

    #[instrument(skip(self))]
    async fn list(&self, project_id: Option<ProjectId>) -> StorageResult<Vec<Session>> {
        let all: Vec<Session> = self.db.client().select(SESSION_TABLE).await?;
        Ok(all
            .into_iter()
            .filter(|s| !s.is_deleted())
            .filter(|s| project_id.is_none_or(|p| s.project_id == Some(p)))
            .collect())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: SessionId) -> StorageResult<()> {
        let mut session = self.get(id).await?;
        session.deleted_at = Some(Utc::now());
        self.update(session).await?;
        Ok(())
    }
}

/// `SurrealDB`-backed [`ProjectRepository`].
#[derive(Clone)]
pub struct SurrealProjectRepository {
    db: Arc<Database>,
}

impl SurrealProjectRepository {
    /// Wrap a shared database handle.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProjectRepository for SurrealProjectRepository {
    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn create(&self, project: Project) -> StorageResult<Project> {
        let created: Option<Project> = self
            .db
            .client()
            .create((PROJECT_TABLE, project.id.to_string()))
            .content(project)
            .await?;
        created.ok_or_else(|| StorageError::Internal("project create returned no row".into()))
    }

    #[instrument(skip(self))]
    async fn get(&self, id: ProjectId) -> StorageResult<Project> {
        let found: Option<Project> = self
            .db
            .client()
            .select((PROJECT_TABLE, id.to_string()))
            .await?;
        match found {
            Some(p) if p.deleted_at.is_some() => Err(StorageError::Deleted(id.to_string())),
            Some(p) => Ok(p),
            None => Err(StorageError::NotFound(id.to_string())),
        }
    }

    #[instrument(skip(self, project), fields(project_id = %project.id))]
    async fn update(&self, mut project: Project) -> StorageResult<Project> {
        project.updated_at = Utc::now();
        let updated: Option<Project> = self
            .db
            .client()
            .update((PROJECT_TABLE, project.id.to_string()))
            .content(project.clone())
            .await?;
        updated.ok_or_else(|| StorageError::NotFound(project.id.to_string()))
    }

    #[instrument(skip(self))]
    async fn list(&self) -> StorageResult<Vec<Project>> {
        let all: Vec<Project> = self.db.client().select(PROJECT_TABLE).await?;
        Ok(all.into_iter().filter(|p| p.deleted_at.is_none()).collect())
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: ProjectId) -> StorageResult<()> {
        let mut project = self.get(id).await?;
        project.deleted_at = Some(Utc::now());
        self.update(project).await?;
        Ok(())
    }
}

/// `SurrealDB`-backed [`MessageRepository`].
#[derive(Clone)]
pub struct SurrealMessageRepository {
    db: Arc<Database>,
}

impl SurrealMessageRepository {
    /// Wrap a shared database handle.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MessageRepository for SurrealMessageRepository {
    #[instrument(skip(self, message), fields(session_id = %message.session_id))]
    async fn create(&self, message: Message) -> StorageResult<Message> {
        let created: Option<Message> = self
            .db
            .client()
            .create((MESSAGE_TABLE, message.id.to_string()))
            .content(message)
            .await?;
        created.ok_or_else(|| StorageError::Internal("message create returned no row".into()))
    }

    #[instrument(skip(self))]
    async fn list_for_session(&self, session_id: SessionId) -> StorageResult<Vec<Message>> {
        let all: Vec<Message> = self.db.client().select(MESSAGE_TABLE).await?;
        let mut mine: Vec<Message> = all
            .into_iter()
            .filter(|m| m.session_id == session_id)
            .collect();
        mine.sort_by_key(|m| m.created_at);
        Ok(mine)
    }

    #[instrument(skip(self))]
    async fn delete_for_session(&self, session_id: SessionId) -> StorageResult<()> {
        let mine = self.list_for_session(session_id).await?;
        for message in mine {
            let _: Option<Message> = self
                .db
                .client()
                .delete((MESSAGE_TABLE, message.id.to_string()))
                .await?;
        }
        Ok(())
    }
}

/// `SurrealDB`-backed [`ActivityLogRepository`].
#[derive(Clone)]
pub struct SurrealActivityLogRepository {
    db: Arc<Database>,
}

impl SurrealActivityLogRepository {
    /// Wrap a shared database handle.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ActivityLogRepository for SurrealActivityLogRepository {
    #[instrument(skip(self, entry))]
    async fn append(&self, entry: ActivityLogEntry) -> StorageResult<ActivityLogEntry> {
        let created: Option<ActivityLogEntry> = self
            .db
            .client()
            .create((ACTIVITY_LOG_TABLE, entry.id.to_string()))
            .content(entry)
            .await?;
        created.ok_or_else(|| StorageError::Internal("activity log append returned no row".into()))
    }

    #[instrument(skip(self))]
    async fn list_for_session(&self, session_id: SessionId) -> StorageResult<Vec<ActivityLogEntry>> {
        let all: Vec<ActivityLogEntry> = self.db.client().select(ACTIVITY_LOG_TABLE).await?;
        let mut mine: Vec<ActivityLogEntry> = all
            .into_iter()
            .filter(|e| e.session_id == Some(session_id))
            .collect();
        mine.sort_by_key(|e| e.created_at);
        Ok(mine)
    }
}

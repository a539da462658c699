//! Project Overlay: the three all-or-nothing project operations
//! (`assign_pm`, `remove_pm`, `create_project`) layered on top of the plain
//! CRUD the Session Store and Agent Repository expose.
//!
//! `conclave_storage::Database` has no `transaction()` — unlike
//! `astrid-storage::Database`, which wraps a single pooled connection this
//! crate could have started a transaction on, this workspace's `Database`
//! only exposes `connect_embedded`/`connect_memory`/`client()`. Atomicity
//! here is therefore sequential repository calls with manual compensation:
//! each operation undoes its own completed steps if a later step fails,
//! best-effort, rather than relying on a database-level rollback.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use conclave_core::{AgentId, ProjectId, SessionId, SessionStatus, SessionType};
use conclave_repos::AgentRepository;
use conclave_storage::{Project, ProjectRepository, Session, SessionRepository};

use crate::error::{RuntimeError, RuntimeResult};

const PROJECT_MD: &str = "PROJECT.md";

/// Renders `PROJECT.md`'s contents from a project's current assignment.
/// Regenerated (not appended) on every `assign_pm`/`remove_pm`/team change.
fn render_project_md(project: &Project, pm_name: Option<&str>, team_member_names: &[String]) -> String {
    let mut out = format!("# {}\n\n{}\n\n", project.name, project.description);
    out.push_str("## Project Manager\n\n");
    match pm_name {
        Some(name) => out.push_str(&format!("- {name}\n\n")),
        None => out.push_str("_unassigned_\n\n"),
    }
    out.push_str("## Team\n\n");
    if team_member_names.is_empty() {
        out.push_str("_no team members yet_\n");
    } else {
        for name in team_member_names {
            out.push_str(&format!("- {name}\n"));
        }
    }
    out
}

/// Implements the project-lifecycle operations spec.md §4.8 requires to be
/// all-or-nothing, over repositories that offer no shared transaction.
pub struct ProjectOverlay {
    projects: Arc<dyn ProjectRepository>,
    sessions: Arc<dyn SessionRepository>,
    agents: Arc<dyn AgentRepository>,
}

impl ProjectOverlay {
    /// Assemble an overlay from its repositories.
    #[must_use]
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        sessions: Arc<dyn SessionRepository>,
        agents: Arc<dyn AgentRepository>,
    ) -> Self {
        Self { projects, sessions, agents }
    }

    /// Create a `pm` session for `agent_id` in `project_id` and bind both
    /// `pm_agent_id`/`pm_session_id` on the project. If the project update
    /// fails after the session was created, the session is soft-deleted so
    /// no orphaned `pm` session survives a failed assignment.
    pub async fn assign_pm(&self, project_id: ProjectId, agent_id: AgentId) -> RuntimeResult<SessionId> {
        let mut project = self.get_project(project_id).await?;
        self.agents
            .get_by_id(agent_id.as_str())
            .await?
            .ok_or_else(|| RuntimeError::InvalidArgument(format!("unknown agent: {}", agent_id.as_str())))?;

        let now = Utc::now();
        let session = Session {
            id: SessionId::new(),
            agent_id: Some(agent_id.clone()),
            project_id: Some(project_id),
            session_type: SessionType::Pm,
            status: SessionStatus::Initializing,
            external_session_id: None,
            context: std::collections::HashMap::new(),
            error_message: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let session = self.sessions.create(session).await?;

        project.pm_agent_id = Some(agent_id);
        project.pm_session_id = Some(session.id);
        project.updated_at = Utc::now();
        if let Err(err) = self.projects.update(project.clone()).await {
            tracing::error!(session_id = %session.id, %err, "assign_pm: project update failed, rolling back session");
            let _ = self.sessions.soft_delete(session.id).await;
            return Err(err.into());
        }

        if let Err(err) = self.regenerate_project_md(project_id).await {
            tracing::warn!(project_id = %project_id, %err, "assign_pm: PROJECT.md regeneration failed");
        }

        Ok(session.id)
    }

    /// Clear a project's PM assignment and soft-delete its `pm` session.
    /// The project is cleared first: if the subsequent soft-delete fails,
    /// the project is left correctly unassigned with a merely-orphaned
    /// session, never the reverse (a deleted session the project still
    /// points at).
    pub async fn remove_pm(&self, project_id: ProjectId) -> RuntimeResult<()> {
        let mut project = self.get_project(project_id).await?;
        let Some(pm_session_id) = project.pm_session_id else {
            return Ok(());
        };

        project.pm_agent_id = None;
        project.pm_session_id = None;
        project.updated_at = Utc::now();
        self.projects.update(project.clone()).await?;

        if let Err(err) = self.sessions.soft_delete(pm_session_id).await {
            tracing::error!(session_id = %pm_session_id, %err, "remove_pm: orphaned pm session could not be soft-deleted");
        }

        if let Err(err) = self.regenerate_project_md(project_id).await {
            tracing::warn!(project_id = %project_id, %err, "remove_pm: PROJECT.md regeneration failed");
        }

        Ok(())
    }

    /// Create a project's working directory, its row, an optional PM
    /// assignment, and its initial `PROJECT.md`. Rolls back the directory
    /// (best-effort) and soft-deletes the project row if any later step
    /// fails.
    pub async fn create_project(
        &self,
        name: String,
        description: String,
        path: PathBuf,
        pm_agent_id: Option<AgentId>,
        team_member_ids: Vec<AgentId>,
    ) -> RuntimeResult<ProjectId> {
        std::fs::create_dir_all(&path)?;

        let now = Utc::now();
        let project = Project {
            id: ProjectId::new(),
            name,
            description,
            path: path.to_string_lossy().into_owned(),
            pm_agent_id: None,
            pm_session_id: None,
            team_member_ids,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let project = match self.projects.create(project).await {
            Ok(project) => project,
            Err(err) => {
                self.remove_dir_best_effort(&path);
                return Err(err.into());
            }
        };

        if let Some(agent_id) = pm_agent_id {
            if let Err(err) = self.assign_pm(project.id, agent_id).await {
                tracing::error!(project_id = %project.id, %err, "create_project: pm assignment failed, rolling back");
                let _ = self.projects.soft_delete(project.id).await;
                self.remove_dir_best_effort(&path);
                return Err(err);
            }
        } else if let Err(err) = self.regenerate_project_md(project.id).await {
            tracing::error!(project_id = %project.id, %err, "create_project: PROJECT.md write failed, rolling back");
            let _ = self.projects.soft_delete(project.id).await;
            self.remove_dir_best_effort(&path);
            return Err(err);
        }

        Ok(project.id)
    }

    async fn regenerate_project_md(&self, project_id: ProjectId) -> RuntimeResult<()> {
        let project = self.get_project(project_id).await?;

        let pm_name = match &project.pm_agent_id {
            Some(agent_id) => self.agents.get_by_id(agent_id.as_str()).await?.map(|a| a.name),
            None => None,
        };

        let mut team_member_names = Vec::with_capacity(project.team_member_ids.len());
        for agent_id in &project.team_member_ids {
            if let Some(agent) = self.agents.get_by_id(agent_id.as_str()).await? {
                team_member_names.push(agent.name);
            }
        }

        let contents = render_project_md(&project, pm_name.as_deref(), &team_member_names);
        std::fs::write(Path::new(&project.path).join(PROJECT_MD), contents)?;
        Ok(())
    }

    async fn get_project(&self, project_id: ProjectId) -> RuntimeResult<Project> {
        self.projects.get(project_id).await.map_err(|_| RuntimeError::ProjectNotFound(project_id))
    }

    fn remove_dir_best_effort(&self, path: &Path) {
        if let Err(err) = std::fs::remove_dir_all(path) {
            tracing::warn!(path = %path.display(), %err, "failed to roll back project directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_md_lists_pm_and_team() {
        let now = Utc::now();
        let project = Project {
            id: ProjectId::new(),
            name: "Widgets".to_string(),
            description: "Build the widget pipeline".to_string(),
            path: "/tmp/widgets".to_string(),
            pm_agent_id: None,
            pm_session_id: None,
            team_member_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let rendered = render_project_md(&project, Some("Alice"), &["Bob".to_string(), "Carol".to_string()]);
        assert!(rendered.contains("# Widgets"));
        assert!(rendered.contains("- Alice"));
        assert!(rendered.contains("- Bob"));
        assert!(rendered.contains("- Carol"));
    }

    #[test]
    fn project_md_notes_unassigned_pm_and_empty_team() {
        let now = Utc::now();
        let project = Project {
            id: ProjectId::new(),
            name: "Empty".to_string(),
            description: String::new(),
            path: "/tmp/empty".to_string(),
            pm_agent_id: None,
            pm_session_id: None,
            team_member_ids: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let rendered = render_project_md(&project, None, &[]);
        assert!(rendered.contains("_unassigned_"));
        assert!(rendered.contains("_no team members yet_"));
    }
}

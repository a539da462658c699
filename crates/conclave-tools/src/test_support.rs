//! In-memory fakes for the repositories and enqueuer, shared by every tool's
//! unit tests so each test file only has to describe its fixture data.

#![allow(missing_docs)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use conclave_core::{AgentId, ProjectId, SessionId, SessionStatus, SessionType};
use conclave_repos::{Agent, AgentRepository, RepoError, RepoResult, Skill, SkillRepository};
use conclave_storage::{Project, ProjectRepository, Session, SessionRepository, StorageError, StorageResult};

use crate::context::{RequestContext, ToolContext};
use crate::error::ToolError;

pub fn fake_session(status: SessionStatus, session_type: SessionType, project_id: Option<ProjectId>) -> Session {
    let now = Utc::now();
    Session {
        id: SessionId::new(),
        agent_id: None,
        project_id,
        session_type,
        status,
        external_session_id: None,
        context: HashMap::new(),
        error_message: None,
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn fake_project(name: &str) -> Project {
    let now = Utc::now();
    Project {
        id: ProjectId::new(),
        name: name.to_string(),
        description: String::new(),
        path: "/tmp/project".to_string(),
        pm_agent_id: None,
        pm_session_id: None,
        team_member_ids: Vec::new(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn fake_request() -> RequestContext {
    RequestContext {
        caller_session_id: SessionId::new(),
        caller_project_id: Some(ProjectId::new()),
        caller_agent_id: Some(AgentId::new("pm")),
        caller_session_type: SessionType::Pm,
        caller_display_name: "Pm".to_string(),
        workspace_root: std::env::temp_dir(),
    }
}

#[derive(Default)]
pub struct FakeSessionRepository {
    rows: Mutex<HashMap<SessionId, Session>>,
}

impl FakeSessionRepository {
    pub fn with(sessions: Vec<Session>) -> Self {
        let rows = sessions.into_iter().map(|s| (s.id, s)).collect();
        Self { rows: Mutex::new(rows) }
    }
}

#[async_trait]
impl SessionRepository for FakeSessionRepository {
    async fn create(&self, session: Session) -> StorageResult<Session> {
        self.rows.lock().unwrap().insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> StorageResult<Session> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .filter(|s| !s.is_deleted())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn update(&self, session: Session) -> StorageResult<Session> {
        self.rows.lock().unwrap().insert(session.id, session.clone());
        Ok(session)
    }

    async fn list(&self, project_id: Option<ProjectId>) -> StorageResult<Vec<Session>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| !s.is_deleted())
            .filter(|s| project_id.is_none_or(|p| s.project_id == Some(p)))
            .cloned()
            .collect())
    }

    async fn soft_delete(&self, id: SessionId) -> StorageResult<()> {
        if let Some(s) = self.rows.lock().unwrap().get_mut(&id) {
            s.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeProjectRepository {
    rows: Mutex<HashMap<ProjectId, Project>>,
}

impl FakeProjectRepository {
    pub fn with(projects: Vec<Project>) -> Self {
        let rows = projects.into_iter().map(|p| (p.id, p)).collect();
        Self { rows: Mutex::new(rows) }
    }
}

#[async_trait]
impl ProjectRepository for FakeProjectRepository {
    async fn create(&self, project: Project) -> StorageResult<Project> {
        self.rows.lock().unwrap().insert(project.id, project.clone());
        Ok(project)
    }

    async fn get(&self, id: ProjectId) -> StorageResult<Project> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    async fn update(&self, project: Project) -> StorageResult<Project> {
        self.rows.lock().unwrap().insert(project.id, project.clone());
        Ok(project)
    }

    async fn list(&self) -> StorageResult<Vec<Project>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn soft_delete(&self, id: ProjectId) -> StorageResult<()> {
        if let Some(p) = self.rows.lock().unwrap().get_mut(&id) {
            p.deleted_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeAgentRepository {
    rows: Mutex<HashMap<String, Agent>>,
}

impl FakeAgentRepository {
    pub fn with(agents: Vec<Agent>) -> Self {
        let rows = agents.into_iter().map(|a| (a.id.clone(), a)).collect();
        Self { rows: Mutex::new(rows) }
    }
}

#[async_trait]
impl AgentRepository for FakeAgentRepository {
    async fn create(&self, agent: Agent) -> RepoResult<Agent> {
        self.rows.lock().unwrap().insert(agent.id.clone(), agent.clone());
        Ok(agent)
    }

    async fn get_by_id(&self, agent_id: &str) -> RepoResult<Option<Agent>> {
        Ok(self.rows.lock().unwrap().get(agent_id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> RepoResult<Option<Agent>> {
        let name_lower = name.to_lowercase();
        Ok(self.rows.lock().unwrap().values().find(|a| a.name.to_lowercase() == name_lower).cloned())
    }

    async fn get_all(&self) -> RepoResult<Vec<Agent>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, agent: Agent) -> RepoResult<Agent> {
        self.rows.lock().unwrap().insert(agent.id.clone(), agent.clone());
        Ok(agent)
    }

    async fn delete(&self, agent_id: &str) -> RepoResult<()> {
        self.rows
            .lock()
            .unwrap()
            .remove(agent_id)
            .map(|_| ())
            .ok_or_else(|| RepoError::NotFound(agent_id.to_string()))
    }

    async fn exists(&self, agent_id: &str) -> RepoResult<bool> {
        Ok(self.rows.lock().unwrap().contains_key(agent_id))
    }

    async fn load_agent_content(&self, agent_id: &str) -> RepoResult<String> {
        self.rows
            .lock()
            .unwrap()
            .get(agent_id)
            .map(|a| format!("---\nname: {}\n---\n", a.name))
            .ok_or_else(|| RepoError::NotFound(agent_id.to_string()))
    }

    async fn load_supporting_doc(&self, _agent_id: &str, doc_path: &str) -> RepoResult<String> {
        Err(RepoError::NotFound(doc_path.to_string()))
    }
}

#[derive(Default)]
pub struct FakeSkillRepository {
    rows: Mutex<HashMap<String, Skill>>,
}

impl FakeSkillRepository {
    pub fn with(skills: Vec<Skill>) -> Self {
        let rows = skills.into_iter().map(|s| (s.id.clone(), s)).collect();
        Self { rows: Mutex::new(rows) }
    }
}

#[async_trait]
impl SkillRepository for FakeSkillRepository {
    async fn create(&self, skill: Skill) -> RepoResult<Skill> {
        self.rows.lock().unwrap().insert(skill.id.clone(), skill.clone());
        Ok(skill)
    }

    async fn get_by_id(&self, skill_id: &str) -> RepoResult<Option<Skill>> {
        Ok(self.rows.lock().unwrap().get(skill_id).cloned())
    }

    async fn get_all(&self) -> RepoResult<Vec<Skill>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, skill: Skill) -> RepoResult<Skill> {
        self.rows.lock().unwrap().insert(skill.id.clone(), skill.clone());
        Ok(skill)
    }

    async fn delete(&self, skill_id: &str) -> RepoResult<()> {
        self.rows
            .lock()
            .unwrap()
            .remove(skill_id)
            .map(|_| ())
            .ok_or_else(|| RepoError::NotFound(skill_id.to_string()))
    }

    async fn load_skill_content(&self, skill_id: &str) -> RepoResult<String> {
        self.rows
            .lock()
            .unwrap()
            .get(skill_id)
            .map(|s| format!("---\nname: {}\n---\n", s.name))
            .ok_or_else(|| RepoError::NotFound(skill_id.to_string()))
    }
}

/// Records every `enqueue` call it receives; never fails.
#[derive(Default)]
pub struct FakeEnqueuer {
    pub calls: Mutex<Vec<(SessionId, String, Option<String>)>>,
}

#[async_trait]
impl crate::context::SessionEnqueuer for FakeEnqueuer {
    async fn enqueue(
        &self,
        session_id: SessionId,
        content: String,
        _sender_agent_id: Option<AgentId>,
        sender_name: Option<String>,
        _from_instance_id: Option<SessionId>,
    ) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push((session_id, content, sender_name));
        Ok(())
    }
}

pub fn ctx_with(sessions: Vec<Session>, projects: Vec<Project>) -> (ToolContext, std::sync::Arc<FakeEnqueuer>) {
    let enqueuer = std::sync::Arc::new(FakeEnqueuer::default());
    let ctx = ToolContext::new(
        std::sync::Arc::new(FakeSessionRepository::with(sessions)),
        std::sync::Arc::new(FakeProjectRepository::with(projects)),
        std::sync::Arc::new(FakeAgentRepository::default()),
        std::sync::Arc::new(FakeSkillRepository::default()),
        enqueuer.clone(),
        std::sync::Arc::new(crate::context::TokioBackgroundSpawner),
    );
    (ctx, enqueuer)
}

pub fn ctx_with_agents(agents: Vec<Agent>) -> ToolContext {
    ToolContext::new(
        std::sync::Arc::new(FakeSessionRepository::default()),
        std::sync::Arc::new(FakeProjectRepository::default()),
        std::sync::Arc::new(FakeAgentRepository::with(agents)),
        std::sync::Arc::new(FakeSkillRepository::default()),
        std::sync::Arc::new(FakeEnqueuer::default()),
        std::sync::Arc::new(crate::context::TokioBackgroundSpawner),
    )
}

pub fn ctx_with_skills(skills: Vec<Skill>) -> ToolContext {
    ToolContext::new(
        std::sync::Arc::new(FakeSessionRepository::default()),
        std::sync::Arc::new(FakeProjectRepository::default()),
        std::sync::Arc::new(FakeAgentRepository::default()),
        std::sync::Arc::new(FakeSkillRepository::with(skills)),
        std::sync::Arc::new(FakeEnqueuer::default()),
        std::sync::Arc::new(crate::context::TokioBackgroundSpawner),
    )
}

//! In-memory fakes for the runtime's integration tests: the same repository
//! traits `conclave-tools`' own `test_support` fakes, plus a scripted
//! [`AgentClient`]/[`AgentClientFactory`] pair standing in for a real agent
//! subprocess.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use conclave_core::{AgentId, ProjectId, SessionId, SessionStatus, SessionType};
use conclave_llm::{AgentClient, ClientConfig, ClientError, ClientResult, RawMessage};
use conclave_repos::{Agent, AgentRepository, RepoError, RepoResult, Skill, SkillRepository};
use conclave_runtime::AgentClientFactory;
use conclave_storage::{
    ActivityLogEntry, ActivityLogRepository, Message, MessageRepository, Project, ProjectRepository, Session,
    SessionRepository, StorageError, StorageResult,
};

pub fn fake_project(name: &str, path: impl Into<String>) -> Project {
    let now = Utc::now();
    Project {
        id: ProjectId::new(),
        name: name.to_string(),
        description: String::new(),
        path: path.into(),
        pm_agent_id: None,
        pm_session_id: None,
        team_member_ids: Vec::new(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    }
}

pub fn fake_session(
    status: SessionStatus,
    session_type: SessionType,
    project_id: Option<ProjectId>,
    agent_id: Option<AgentId>,
) -> Session {
    let now = Utc::now();
    Session {
        id: SessionId::new(),
        agent_id,
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

#[derive(Default)]
pub struct FakeSessionRepository {
    rows: Mutex<HashMap<SessionId, Session>>,
}

impl FakeSessionRepository {
    pub fn with(sessions: Vec<Session>) -> Self {
        let rows = sessions.into_iter().map(|s| (s.id, s)).collect();
        Self { rows: Mutex::new(rows) }
    }

    pub fn rows_status(&self, id: SessionId) -> Option<SessionStatus> {
        self.rows.lock().unwrap().get(&id).map(|s| s.status)
    }

    pub fn all_of_type(&self, project_id: ProjectId, session_type: SessionType) -> Vec<Session> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .filter(|s| !s.is_deleted() && s.project_id == Some(project_id) && s.session_type == session_type)
            .cloned()
            .collect()
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
        self.rows.lock().unwrap().get(&id).cloned().ok_or_else(|| StorageError::NotFound(id.to_string()))
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
pub struct FakeMessageRepository {
    rows: Mutex<Vec<Message>>,
}

#[async_trait]
impl MessageRepository for FakeMessageRepository {
    async fn create(&self, message: Message) -> StorageResult<Message> {
        self.rows.lock().unwrap().push(message.clone());
        Ok(message)
    }

    async fn list_for_session(&self, session_id: SessionId) -> StorageResult<Vec<Message>> {
        Ok(self.rows.lock().unwrap().iter().filter(|m| m.session_id == session_id).cloned().collect())
    }

    async fn delete_for_session(&self, session_id: SessionId) -> StorageResult<()> {
        self.rows.lock().unwrap().retain(|m| m.session_id != session_id);
        Ok(())
    }
}

impl FakeMessageRepository {
    pub fn for_session(&self, session_id: SessionId) -> Vec<Message> {
        self.rows.lock().unwrap().iter().filter(|m| m.session_id == session_id).cloned().collect()
    }
}

#[derive(Default)]
pub struct FakeActivityLogRepository {
    rows: Mutex<Vec<ActivityLogEntry>>,
}

#[async_trait]
impl ActivityLogRepository for FakeActivityLogRepository {
    async fn append(&self, entry: ActivityLogEntry) -> StorageResult<ActivityLogEntry> {
        self.rows.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list_for_session(&self, session_id: SessionId) -> StorageResult<Vec<ActivityLogEntry>> {
        Ok(self.rows.lock().unwrap().iter().filter(|e| e.session_id == Some(session_id)).cloned().collect())
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
        self.rows.lock().unwrap().remove(agent_id).map(|_| ()).ok_or_else(|| RepoError::NotFound(agent_id.to_string()))
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
        self.rows.lock().unwrap().remove(skill_id).map(|_| ()).ok_or_else(|| RepoError::NotFound(skill_id.to_string()))
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

/// One scripted turn: the raw messages a fake client yields from
/// `receive_message`, each optionally preceded by a delay (used by the
/// interrupt scenario to give the test time to interrupt mid-stream).
pub struct ScriptedClient {
    queue: Mutex<VecDeque<(Duration, RawMessage)>>,
    queries: Mutex<Vec<String>>,
    alive: AtomicBool,
    interrupted: AtomicBool,
}

impl ScriptedClient {
    #[must_use]
    pub fn new(messages: Vec<RawMessage>) -> Arc<Self> {
        let queue = messages.into_iter().map(|m| (Duration::ZERO, m)).collect();
        Arc::new(Self { queue: Mutex::new(queue), queries: Mutex::new(Vec::new()), alive: AtomicBool::new(false), interrupted: AtomicBool::new(false) })
    }

    /// Like [`Self::new`], but the message at `index` is preceded by `delay`
    /// — used to hold the stream open long enough for a test to interrupt it.
    #[must_use]
    pub fn with_delay(messages: Vec<RawMessage>, index: usize, delay: Duration) -> Arc<Self> {
        let client = Self::new(messages);
        let mut queue = client.queue.lock().unwrap();
        if let Some(entry) = queue.get_mut(index) {
            entry.0 = delay;
        }
        drop(queue);
        client
    }

    pub fn was_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    pub fn sent_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentClient for ScriptedClient {
    async fn connect(&self) -> ClientResult<()> {
        self.alive.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn query(&self, message: &str) -> ClientResult<()> {
        self.queries.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn receive_message(&self) -> ClientResult<Option<RawMessage>> {
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some((delay, message)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(Some(message))
            }
            None => Ok(None),
        }
    }

    async fn interrupt(&self) -> ClientResult<()> {
        self.interrupted.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn disconnect(&self) -> ClientResult<()> {
        self.alive.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn session_id(&self) -> Option<String> {
        None
    }
}

/// Hands out pre-scripted clients in the order the runtime asks for them —
/// tests arrange scripts in the order their scenario is expected to create
/// sessions' clients. Any creation past the end of the list gets a client
/// that completes its turn immediately with no tool calls, so unplanned
/// resume retries don't panic the test.
pub struct ScriptedClientFactory {
    scripts: Mutex<VecDeque<Arc<ScriptedClient>>>,
    handed_out: Mutex<Vec<Arc<ScriptedClient>>>,
}

impl ScriptedClientFactory {
    #[must_use]
    pub fn new(scripts: Vec<Arc<ScriptedClient>>) -> Arc<Self> {
        Arc::new(Self { scripts: Mutex::new(scripts.into()), handed_out: Mutex::new(Vec::new()) })
    }

    pub fn handed_out(&self) -> Vec<Arc<ScriptedClient>> {
        self.handed_out.lock().unwrap().clone()
    }
}

impl AgentClientFactory for ScriptedClientFactory {
    fn create(&self, _config: ClientConfig) -> Arc<dyn AgentClient> {
        let client = self.scripts.lock().unwrap().pop_front().unwrap_or_else(|| ScriptedClient::new(vec![end_turn_event()]));
        self.handed_out.lock().unwrap().push(client.clone());
        client
    }
}

pub fn message_start() -> RawMessage {
    RawMessage::StreamEvent(conclave_llm::StreamEvent { session_id: None, event: serde_json::json!({"type": "message_start"}) })
}

pub fn text_delta(index: u64, text: &str) -> RawMessage {
    RawMessage::StreamEvent(conclave_llm::StreamEvent {
        session_id: None,
        event: serde_json::json!({"type": "content_block_delta", "index": index, "delta": {"type": "text_delta", "text": text}}),
    })
}

pub fn content_block_stop(index: u64) -> RawMessage {
    RawMessage::StreamEvent(conclave_llm::StreamEvent {
        session_id: None,
        event: serde_json::json!({"type": "content_block_stop", "index": index}),
    })
}

pub fn end_turn_event() -> RawMessage {
    RawMessage::StreamEvent(conclave_llm::StreamEvent {
        session_id: None,
        event: serde_json::json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}}),
    })
}

pub fn tool_use_message(id: &str, name: &str, input: serde_json::Value) -> RawMessage {
    RawMessage::AssistantMessage(conclave_llm::AssistantMessage {
        content: vec![conclave_llm::ContentBlock::ToolUse { id: id.to_string(), name: name.to_string(), input }],
        error: None,
    })
}

/// Poll `check` every 10ms until it returns `true` or `timeout` elapses, then
/// panic. Used in place of a fixed sleep since processing happens on a
/// detached task the test doesn't otherwise synchronize with.
pub async fn wait_until(timeout: Duration, mut check: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn noop_client_error() -> ClientError {
    ClientError::ConnectionFailed("unused".to_string())
}

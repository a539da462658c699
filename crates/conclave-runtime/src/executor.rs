//! Session Executor: the per-session FIFO message processor, the hardest
//! part of the runtime. Pulls a queued message, drives the agent client
//! through one turn, converts its raw output to domain events, persists and
//! broadcasts them, and dispatches any in-process tool calls the turn makes.
//!
//! The processor-per-session/queue/lock shape is grounded on
//! `astrid_runtime::runtime::execution::run_loop`'s streaming accumulation
//! loop and `astrid_runtime::subagent_executor::SubAgentExecutor`'s
//! `tokio::select!`-driven cancellation, generalized from "one subagent run"
//! to "a session's lifetime FIFO of turns".

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use conclave_core::{AgentId, ProjectId, SessionId, SessionEvent, SessionStatus, SessionType};
use conclave_events::{Attribution, DomainEvent};
use conclave_hooks::HookRegistry;
use conclave_llm::{AgentClient, RawMessage};
use conclave_repos::{Agent, AgentRepository, SkillRepository};
use conclave_storage::{
    ActivityLogEntry, ActivityLogRepository, Message, MessageRepository, MessageRole, Project, ProjectRepository,
    Session, SessionRepository,
};
use conclave_tools::{BackgroundSpawner, RequestContext, SessionEnqueuer, ToolContext, ToolRegistry};
use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::AbortHandle;

use crate::builder::{BuildInput, SessionBuilder, PM_MANAGEMENT_TOOLS};
use crate::client_manager::{is_resume_failure, AgentClientFactory, ClientManager};
use crate::error::{RuntimeError, RuntimeResult};

/// A `BackgroundSpawner` backed by a `JoinSet`, so the runtime can await
/// outstanding background tasks (e.g. `remind`'s delayed callback) during
/// shutdown instead of abandoning them mid-flight.
///
/// `spawn` is a sync fn (per [`BackgroundSpawner`]'s signature) but
/// registering with the `JoinSet` needs an async lock, so the registration
/// itself is done on a short-lived spawned task rather than inline.
#[derive(Clone)]
pub struct TrackedSpawner {
    tasks: Arc<AsyncMutex<tokio::task::JoinSet<()>>>,
}

impl TrackedSpawner {
    /// An empty spawner.
    #[must_use]
    pub fn new() -> Self {
        Self { tasks: Arc::new(AsyncMutex::new(tokio::task::JoinSet::new())) }
    }

    /// Await every outstanding background task.
    pub async fn join_all(&self) {
        let mut tasks = self.tasks.lock().await;
        while tasks.join_next().await.is_some() {}
    }
}

impl Default for TrackedSpawner {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundSpawner for TrackedSpawner {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        let tasks = self.tasks.clone();
        tokio::spawn(async move {
            tasks.lock().await.spawn(future);
        });
    }
}

/// One message waiting to be delivered to a session's agent client.
struct QueuedMessage {
    content: String,
    sender_agent_id: Option<AgentId>,
    sender_name: Option<String>,
    from_instance_id: Option<SessionId>,
}

struct SessionQueueState {
    queue: VecDeque<QueuedMessage>,
    processing: bool,
    task: Option<AbortHandle>,
}

impl SessionQueueState {
    fn new() -> Self {
        Self { queue: VecDeque::new(), processing: false, task: None }
    }
}

/// Per-session state: the mutex is the spec's "lock", serializing every
/// decision about whether a processor is running and what it still has left
/// to do.
struct SessionState {
    inner: AsyncMutex<SessionQueueState>,
}

impl SessionState {
    fn new() -> Self {
        Self { inner: AsyncMutex::new(SessionQueueState::new()) }
    }
}

const WELCOME_PM: &str = "Welcome. You're the Project Manager for this project — say hello to your team.";
const WELCOME_ASSISTANT: &str = "Welcome back.";

fn welcome_message(session_type: SessionType) -> Option<&'static str> {
    match session_type {
        SessionType::Pm => Some(WELCOME_PM),
        SessionType::Assistant => Some(WELCOME_ASSISTANT),
        _ => None,
    }
}

/// Drives every session's FIFO queue of turns against its agent client.
/// Cloning is cheap — every field is an `Arc` — so the executor can hand
/// itself to a spawned processor task without a self-referential `Arc`.
#[derive(Clone)]
pub struct SessionExecutor {
    sessions: Arc<dyn SessionRepository>,
    projects: Arc<dyn ProjectRepository>,
    messages: Arc<dyn MessageRepository>,
    activity_log: Arc<dyn ActivityLogRepository>,
    agents: Arc<dyn AgentRepository>,
    skills: Arc<dyn SkillRepository>,
    builder: Arc<SessionBuilder>,
    client_factory: Arc<dyn AgentClientFactory>,
    clients: Arc<ClientManager>,
    broadcast: Arc<conclave_broadcast::BroadcastRegistry>,
    default_tools: Arc<ToolRegistry>,
    agent_assistant_tools: Arc<ToolRegistry>,
    skill_assistant_tools: Arc<ToolRegistry>,
    hooks: Arc<DashMap<SessionId, HookRegistry>>,
    states: Arc<DashMap<SessionId, Arc<SessionState>>>,
    background: Arc<TrackedSpawner>,
}

impl SessionExecutor {
    /// Assemble an executor from its dependencies. `default_tools` should be
    /// `ToolRegistry::with_defaults()`; the agent/skill-assistant registries
    /// are built here by layering the matching editing tools on top.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        projects: Arc<dyn ProjectRepository>,
        messages: Arc<dyn MessageRepository>,
        activity_log: Arc<dyn ActivityLogRepository>,
        agents: Arc<dyn AgentRepository>,
        skills: Arc<dyn SkillRepository>,
        builder: Arc<SessionBuilder>,
        client_factory: Arc<dyn AgentClientFactory>,
        broadcast: Arc<conclave_broadcast::BroadcastRegistry>,
    ) -> Self {
        let mut agent_assistant_tools = ToolRegistry::with_defaults();
        agent_assistant_tools.register(Box::new(conclave_tools::InitAgentTool));
        agent_assistant_tools.register(Box::new(conclave_tools::ListAgentsTool));
        agent_assistant_tools.register(Box::new(conclave_tools::ValidateAgentTool));

        let mut skill_assistant_tools = ToolRegistry::with_defaults();
        skill_assistant_tools.register(Box::new(conclave_tools::InitSkillTool));
        skill_assistant_tools.register(Box::new(conclave_tools::ListSkillsTool));
        skill_assistant_tools.register(Box::new(conclave_tools::ValidateSkillTool));

        Self {
            sessions,
            projects,
            messages,
            activity_log,
            agents,
            skills,
            builder,
            client_factory,
            clients: Arc::new(ClientManager::new()),
            broadcast,
            default_tools: Arc::new(ToolRegistry::with_defaults()),
            agent_assistant_tools: Arc::new(agent_assistant_tools),
            skill_assistant_tools: Arc::new(skill_assistant_tools),
            hooks: Arc::new(DashMap::new()),
            states: Arc::new(DashMap::new()),
            background: Arc::new(TrackedSpawner::new()),
        }
    }

    fn registry_for(&self, session_type: SessionType) -> &ToolRegistry {
        match session_type {
            SessionType::AgentAssistant => &self.agent_assistant_tools,
            SessionType::SkillAssistant => &self.skill_assistant_tools,
            _ => &self.default_tools,
        }
    }

    fn state_for(&self, session_id: SessionId) -> Arc<SessionState> {
        self.states.entry(session_id).or_insert_with(|| Arc::new(SessionState::new())).clone()
    }

    /// Persist `content`, queue it for delivery, and start the session's
    /// processor if one is not already running. Never blocks on execution —
    /// enqueue returns as soon as the message is durably queued.
    pub async fn enqueue(
        &self,
        session_id: SessionId,
        content: String,
        sender_agent_id: Option<AgentId>,
        sender_name: Option<String>,
        from_instance_id: Option<SessionId>,
    ) -> RuntimeResult<usize> {
        let session = self.sessions.get(session_id).await.map_err(|_| RuntimeError::SessionNotFound(session_id))?;
        if session.is_deleted() {
            return Err(RuntimeError::SessionNotFound(session_id));
        }

        let message = Message {
            id: conclave_core::MessageId::new(),
            session_id,
            role: MessageRole::User,
            content: content.clone(),
            tool_use_id: None,
            sequence: 0,
            metadata: HashMap::new(),
            agent_id: sender_agent_id.clone(),
            agent_name: sender_name.clone(),
            from_instance_id,
            response_id: None,
            created_at: Utc::now(),
        };
        self.messages.create(message).await?;
        self.log(session_id, session.project_id, "message.persisted", Value::Null).await;

        let state = self.state_for(session_id);
        let (queue_size, should_start) = {
            let mut guard = state.inner.lock().await;
            guard.queue.push_back(QueuedMessage { content, sender_agent_id, sender_name, from_instance_id });
            let should_start = !guard.processing;
            guard.processing = true;
            (guard.queue.len(), should_start)
        };

        if should_start {
            let this = self.clone();
            let handle = tokio::spawn(async move { this.run_processor(session_id).await });
            let mut guard = state.inner.lock().await;
            guard.task = Some(handle.abort_handle());
        }

        Ok(queue_size)
    }

    /// Interrupt a session mid-turn: kill its client, discard the queue, and
    /// transition it to `interrupted`.
    pub async fn interrupt(&self, session_id: SessionId) -> RuntimeResult<()> {
        let mut session = self.sessions.get(session_id).await?;

        if let Some(client) = self.clients.get(session_id) {
            if let Err(err) = client.interrupt().await {
                tracing::warn!(%session_id, %err, "client interrupt failed");
            }
        }

        let state = self.state_for(session_id);
        {
            let mut guard = state.inner.lock().await;
            if let Some(task) = guard.task.take() {
                task.abort();
            }
            guard.queue.clear();
            guard.processing = false;
        }
        self.clients.remove(session_id).await;

        session.status = session.status.transition(SessionEvent::Interrupt)?;
        session.updated_at = Utc::now();
        self.sessions.update(session.clone()).await?;
        self.log(session_id, session.project_id, "session.interrupted", Value::Null).await;
        Ok(())
    }

    /// Discard a session's entire turn history and reset it to a fresh
    /// `idle` state, as if newly created. The post-recreate status is set
    /// directly rather than through [`SessionStatus::transition`]: `recreate`
    /// is a forceful administrative reset, not a normal lifecycle edge, and
    /// the state machine only models `Error -> Recreate -> Working` (the
    /// "resume the processor" edge), not the settled `Idle` the session
    /// should land in once the queue is confirmed empty.
    pub async fn recreate(&self, session_id: SessionId) -> RuntimeResult<()> {
        let mut session = self.sessions.get(session_id).await?;

        let state = self.state_for(session_id);
        {
            let mut guard = state.inner.lock().await;
            if let Some(task) = guard.task.take() {
                task.abort();
            }
            guard.queue.clear();
            guard.processing = false;
        }
        self.clients.remove(session_id).await;
        self.hooks.remove(&session_id);

        self.messages.delete_for_session(session_id).await?;

        session.external_session_id = None;
        session.error_message = None;
        session.status = SessionStatus::Idle;
        session.updated_at = Utc::now();
        self.sessions.update(session.clone()).await?;
        self.log(session_id, session.project_id, "session.recreated", Value::Null).await;

        if let Some(welcome) = welcome_message(session.session_type) {
            let message = Message {
                id: conclave_core::MessageId::new(),
                session_id,
                role: MessageRole::System,
                content: welcome.to_string(),
                tool_use_id: None,
                sequence: 0,
                metadata: HashMap::new(),
                agent_id: None,
                agent_name: None,
                from_instance_id: None,
                response_id: None,
                created_at: Utc::now(),
            };
            self.messages.create(message).await?;
        }

        Ok(())
    }

    async fn log(&self, session_id: SessionId, project_id: Option<ProjectId>, action: &str, detail: Value) {
        let entry = ActivityLogEntry {
            id: uuid::Uuid::new_v4(),
            session_id: Some(session_id),
            project_id,
            action: action.to_string(),
            detail,
            created_at: Utc::now(),
        };
        if let Err(err) = self.activity_log.append(entry).await {
            tracing::warn!(%session_id, action, %err, "failed to append activity log entry");
        }
    }

    async fn run_processor(self, session_id: SessionId) {
        loop {
            let state = self.state_for(session_id);
            let item = {
                let mut guard = state.inner.lock().await;
                match guard.queue.pop_front() {
                    Some(item) => Some(item),
                    None => {
                        guard.processing = false;
                        guard.task = None;
                        None
                    }
                }
            };
            let Some(item) = item else { break };

            if let Err(err) = self.process_one(session_id, item).await {
                tracing::error!(%session_id, %err, "session processor turn failed");
                self.fail_session(session_id, err.to_string()).await;
                let mut guard = state.inner.lock().await;
                guard.processing = false;
                guard.task = None;
                break;
            }
        }
    }

    async fn fail_session(&self, session_id: SessionId, message: String) {
        self.clients.remove(session_id).await;
        if let Ok(mut session) = self.sessions.get(session_id).await {
            if let Ok(status) = session.status.transition(SessionEvent::TurnFailed) {
                session.status = status;
            }
            session.error_message = Some(message.clone());
            session.updated_at = Utc::now();
            let _ = self.sessions.update(session.clone()).await;
            self.broadcast.broadcast(
                session_id,
                &DomainEvent::Error { message, error_type: Some("turn_failed".to_string()) },
            );
            self.log(session_id, session.project_id, "session.error", Value::Null).await;
        }
    }

    async fn ensure_client(&self, session: &Session) -> RuntimeResult<Arc<dyn AgentClient>> {
        if let Some(client) = self.clients.get(session.id) {
            return Ok(client);
        }

        let input = self.build_input(session).await?;
        let output = self.builder.build(input.clone()).await?;
        match self.clients.create(session.id, self.client_factory.as_ref(), output.config).await {
            Ok(client) => {
                self.hooks.insert(session.id, output.hooks);
                Ok(client)
            }
            Err(err) if session.external_session_id.is_some() && is_resume_failure(&err) => {
                tracing::warn!(session_id = %session.id, %err, "resume failed, retrying without resume token");
                let retry_output = self.builder.build_without_resume(input).await?;
                let client =
                    self.clients.create(session.id, self.client_factory.as_ref(), retry_output.config).await?;
                self.hooks.insert(session.id, retry_output.hooks);
                Ok(client)
            }
            Err(err) => Err(RuntimeError::Client(err)),
        }
    }

    async fn build_input(&self, session: &Session) -> RuntimeResult<BuildInput> {
        let working_dir = match session.project_id {
            Some(project_id) => {
                let project = self.projects.get(project_id).await?;
                std::path::PathBuf::from(project.path)
            }
            None => std::env::temp_dir(),
        };

        let team_member_names = if session.session_type == SessionType::Pm {
            if let Some(project_id) = session.project_id {
                self.team_member_names(project_id).await?
            } else {
                Vec::new()
            }
        } else {
            Vec::new()
        };

        Ok(BuildInput {
            session_id: session.id,
            session_type: session.session_type,
            agent_id: session.agent_id.clone(),
            project_id: session.project_id,
            working_dir,
            team_member_names,
            resume_session_id: session.external_session_id.clone(),
            user_profile: None,
        })
    }

    async fn team_member_names(&self, project_id: ProjectId) -> RuntimeResult<Vec<String>> {
        let project: Project = self.projects.get(project_id).await?;
        let mut names = Vec::new();
        for agent_id in &project.team_member_ids {
            if let Some(agent) = self.agents.get_by_id(agent_id.as_str()).await? {
                names.push(agent.name);
            }
        }
        Ok(names)
    }

    async fn attribution_for(&self, session: &Session) -> RuntimeResult<Attribution> {
        let agent: Option<Agent> = match &session.agent_id {
            Some(agent_id) => self.agents.get_by_id(agent_id.as_str()).await?,
            None => None,
        };
        Ok(Attribution {
            response_id: None,
            agent_id: session.agent_id.as_ref().map(|a| a.as_str().to_string()),
            agent_name: agent.map(|a| a.name).or_else(|| Some(session.session_type.to_string())),
        })
    }

    async fn process_one(&self, session_id: SessionId, item: QueuedMessage) -> RuntimeResult<()> {
        let mut session = self.sessions.get(session_id).await?;
        let client = self.ensure_client(&session).await?;

        session.status = session.status.transition(SessionEvent::MessageEnqueued)?;
        session.updated_at = Utc::now();
        session = self.sessions.update(session).await?;
        self.log(session_id, session.project_id, "session.working", Value::Null).await;
        self.broadcast.broadcast(
            session_id,
            &DomainEvent::UserMessage { content: Value::String(item.content.clone()) },
        );

        client.query(&item.content).await.map_err(RuntimeError::Client)?;

        let attribution = self.attribution_for(&session).await?;
        let mut text_buffers: HashMap<u64, String> = HashMap::new();
        let inactivity = Duration::from_secs(10 * 60);

        loop {
            let received = tokio::time::timeout(inactivity, client.receive_message()).await;
            let raw = match received {
                Ok(Ok(Some(raw))) => raw,
                Ok(Ok(None)) => break,
                Ok(Err(err)) => return Err(RuntimeError::Client(err)),
                Err(_) => return Err(RuntimeError::StreamTimeout(session_id, inactivity)),
            };

            if let RawMessage::StreamEvent(event) = &raw {
                if let Some(external_id) = &event.session_id {
                    if session.external_session_id.as_deref() != Some(external_id.as_str()) {
                        session.external_session_id = Some(external_id.clone());
                        session = self.sessions.update(session.clone()).await?;
                    }
                }
            }

            let events = conclave_events::convert(&raw, &attribution);
            let mut turn_complete = false;
            for event in events {
                self.handle_event(&session, &mut text_buffers, event.clone()).await?;
                self.broadcast.broadcast(session_id, &event);
                if matches!(event, DomainEvent::MessageComplete) {
                    turn_complete = true;
                }
            }
            if turn_complete {
                break;
            }
        }

        session.status = session.status.transition(SessionEvent::TurnComplete)?;
        session.updated_at = Utc::now();
        self.sessions.update(session.clone()).await?;
        self.log(session_id, session.project_id, "session.idle", Value::Null).await;
        Ok(())
    }

    async fn handle_event(
        &self,
        session: &Session,
        text_buffers: &mut HashMap<u64, String>,
        event: DomainEvent,
    ) -> RuntimeResult<()> {
        match event {
            DomainEvent::MessageStart => {
                text_buffers.clear();
            }
            DomainEvent::StreamDelta { content_index, text } => {
                text_buffers.entry(content_index).or_default().push_str(&text);
            }
            DomainEvent::ContentBlockStop { content_index } => {
                if let Some(text) = text_buffers.remove(&content_index) {
                    if !text.is_empty() {
                        self.persist_message(session.id, MessageRole::Assistant, text, None, None).await?;
                    }
                }
            }
            DomainEvent::ToolUse { id, name, input, .. } => {
                self.persist_message(
                    session.id,
                    MessageRole::ToolCall,
                    serde_json::to_string(&input).unwrap_or_default(),
                    Some(id.clone()),
                    None,
                )
                .await?;
                if self.registry_for(session.session_type).contains(&name) {
                    self.dispatch_tool_call(session, id, name, input).await?;
                }
            }
            DomainEvent::ToolComplete { tool_use_id, result, is_error } => {
                self.persist_message(
                    session.id,
                    MessageRole::ToolResult,
                    result.unwrap_or_default(),
                    Some(tool_use_id),
                    None,
                )
                .await?;
                if is_error {
                    tracing::warn!(session_id = %session.id, "tool reported an error result");
                }
            }
            DomainEvent::Error { .. } | DomainEvent::MessageComplete | DomainEvent::UserMessage { .. } => {}
        }
        Ok(())
    }

    async fn persist_message(
        &self,
        session_id: SessionId,
        role: MessageRole,
        content: String,
        tool_use_id: Option<String>,
        response_id: Option<String>,
    ) -> RuntimeResult<()> {
        let message = Message {
            id: conclave_core::MessageId::new(),
            session_id,
            role,
            content,
            tool_use_id,
            sequence: 0,
            metadata: HashMap::new(),
            agent_id: None,
            agent_name: None,
            from_instance_id: None,
            response_id,
            created_at: Utc::now(),
        };
        self.messages.create(message).await?;
        Ok(())
    }

    /// Execute an in-process tool call the subprocess issued and feed the
    /// result back into its conversation as a follow-up query — the only
    /// feedback channel [`AgentClient`] exposes. The subprocess can never
    /// report these tools' results itself, since it doesn't run them.
    async fn dispatch_tool_call(&self, session: &Session, id: String, name: String, input: Value) -> RuntimeResult<()> {
        let request = self.request_context_for(session).await?;
        let ctx = self.tool_context_for();

        let mut args = input;
        if session.session_type == SessionType::Pm && PM_MANAGEMENT_TOOLS.contains(&name.as_str()) {
            let hook_name = format!("pm_management__{name}");
            if let Some(hooks) = self.hooks.get(&session.id) {
                hooks.apply_all(&hook_name, &mut args);
            }
        }

        let registry = self.registry_for(session.session_type);
        let result = registry.execute(&name, args, &request, &ctx).await;

        let is_error = result["content"][0]["text"].as_str().is_some_and(|text| text.starts_with("✗ Error:"));
        let result_text = serde_json::to_string(&result).unwrap_or_default();
        self.broadcast.broadcast(
            session.id,
            &DomainEvent::ToolComplete { tool_use_id: id.clone(), result: Some(result_text.clone()), is_error },
        );
        self.persist_message(session.id, MessageRole::ToolResult, result_text.clone(), Some(id), None).await?;

        let _ = self
            .clients
            .get(session.id)
            .ok_or(RuntimeError::ClientNotFound(session.id))?
            .query(&format!("[tool result for {name}]\n{result_text}"))
            .await
            .map_err(RuntimeError::Client)?;

        Ok(())
    }

    async fn request_context_for(&self, session: &Session) -> RuntimeResult<RequestContext> {
        let display_name = match &session.agent_id {
            Some(agent_id) => self
                .agents
                .get_by_id(agent_id.as_str())
                .await?
                .map(|a| a.name)
                .unwrap_or_else(|| session.session_type.to_string()),
            None => session.session_type.to_string(),
        };
        let workspace_root = match session.project_id {
            Some(project_id) => std::path::PathBuf::from(self.projects.get(project_id).await?.path),
            None => std::env::temp_dir(),
        };
        Ok(RequestContext {
            caller_session_id: session.id,
            caller_project_id: session.project_id,
            caller_agent_id: session.agent_id.clone(),
            caller_session_type: session.session_type,
            caller_display_name: display_name,
            workspace_root,
        })
    }

    fn tool_context_for(&self) -> ToolContext {
        ToolContext::new(
            self.sessions.clone(),
            self.projects.clone(),
            self.agents.clone(),
            self.skills.clone(),
            Arc::new(self.clone()),
            self.background.clone(),
        )
    }

    /// Await every in-flight background task, then disconnect every live
    /// client. Intended for process shutdown.
    pub async fn shutdown(&self) {
        self.background.join_all().await;
        self.clients.shutdown().await;
    }
}

#[async_trait]
impl SessionEnqueuer for SessionExecutor {
    async fn enqueue(
        &self,
        session_id: SessionId,
        content: String,
        sender_agent_id: Option<AgentId>,
        sender_name: Option<String>,
        from_instance_id: Option<SessionId>,
    ) -> Result<(), conclave_tools::ToolError> {
        SessionExecutor::enqueue(self, session_id, content, sender_agent_id, sender_name, from_instance_id)
            .await
            .map(|_| ())
            .map_err(|err| match err {
                RuntimeError::SessionNotFound(id) => conclave_tools::ToolError::SessionNotFound(id),
                RuntimeError::Tool(tool_err) => tool_err,
                other => conclave_tools::ToolError::InvalidArgument(other.to_string()),
            })
    }
}

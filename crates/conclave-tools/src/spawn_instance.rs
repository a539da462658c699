//! `spawn_instance` — PM-only: create a new specialist session.
//!
//! Grounded on `pm_management.py::spawn_instance`: validate the agent
//! exists, create the session row directly (not through the builder — the
//! builder only runs once the first message is enqueued), and leave it at
//! `initializing`/`backlog` without sending a first message.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use conclave_core::{AgentId, SessionStatus, SessionType};
use conclave_storage::Session;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

/// `spawn_instance(agent_id, task_description)`.
pub struct SpawnInstanceTool;

#[async_trait]
impl InstanceTool for SpawnInstanceTool {
    fn name(&self) -> &'static str {
        "spawn_instance"
    }

    fn description(&self) -> &'static str {
        "Create a new specialist work instance for a project task."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "agent_id": { "type": "string", "description": "ID of the specialist agent to spawn, e.g. \"backend-dev\"" },
                "task_description": { "type": "string", "description": "What the new instance should accomplish" },
            },
            "required": ["agent_id", "task_description"],
        })
    }

    async fn execute(&self, args: Value, request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        request.require_pm()?;
        let project_id = request.require_project()?;

        let agent_id = args
            .get("agent_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ToolError::MissingArgument("agent_id"))?;
        let task_description = args
            .get("task_description")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ToolError::MissingArgument("task_description"))?;

        if ctx.agents.get_by_id(agent_id).await?.is_none() {
            let available = ctx
                .agents
                .get_all()
                .await?
                .into_iter()
                .map(|a| a.id)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ToolError::AgentNotFound(agent_id.to_string(), available));
        }

        let mut context = HashMap::new();
        context.insert("task_description".to_string(), Value::String(task_description.to_string()));
        context.insert("spawned_by".to_string(), Value::String("pm".to_string()));
        context.insert("kanban_stage".to_string(), Value::String("backlog".to_string()));

        let now = Utc::now();
        let session = Session {
            id: conclave_core::SessionId::new(),
            agent_id: Some(AgentId::new(agent_id)),
            project_id: Some(project_id),
            session_type: SessionType::Specialist,
            status: SessionStatus::Initializing,
            external_session_id: None,
            context,
            error_message: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = ctx.sessions.create(session).await?;

        tracing::info!(
            session_id = %created.id,
            agent_id,
            project_id = %project_id,
            "spawn_instance created specialist session"
        );

        Ok(ToolOutput::text(format!(
            "✓ Specialist session created successfully!\n\n\
             Session ID: {id}\nAgent: {agent_id}\nTask: {task_description}\nStatus: {status}\n\n\
             ⚠️  Instance is in {status} status. Use contact_instance to send the first message and start execution.",
            id = created.id,
            status = created.status,
        ))
        .with_field("session_id", created.id.to_string())
        .with_field("agent_id", agent_id)
        .with_field("project_id", project_id.to_string()))
    }
}

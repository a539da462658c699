//! `contact_pm` — message the caller's project's PM, without having to know
//! its session id.

use async_trait::async_trait;
use conclave_core::SessionType;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::contact_instance::send_to;
use crate::error::{ToolError, ToolResult};
use crate::tool::InstanceTool;

/// `contact_pm(message)`.
pub struct ContactPmTool;

#[async_trait]
impl InstanceTool for ContactPmTool {
    fn name(&self) -> &'static str {
        "contact_pm"
    }

    fn description(&self) -> &'static str {
        "Send a message to this project's PM."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": { "type": "string", "description": "Message content to send" },
            },
            "required": ["message"],
        })
    }

    async fn execute(&self, args: Value, request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .ok_or(ToolError::MissingArgument("message"))?;

        let project_id = request.require_project()?;
        let sessions = ctx.sessions.list(Some(project_id)).await?;
        let pm = sessions
            .into_iter()
            .filter(|s| s.session_type == SessionType::Pm)
            .max_by_key(|s| s.created_at)
            .ok_or(ToolError::NoPmForProject)?;

        send_to(pm.id, message, request, ctx).await
    }
}

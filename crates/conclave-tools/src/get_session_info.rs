//! `get_session_info` — the caller's own identity and context, for agents
//! that need to introspect themselves (e.g. to decide whether they're the PM).

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::error::ToolResult;
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

/// `get_session_info()`.
pub struct GetSessionInfoTool;

#[async_trait]
impl InstanceTool for GetSessionInfoTool {
    fn name(&self) -> &'static str {
        "get_session_info"
    }

    fn description(&self) -> &'static str {
        "Get the calling instance's own session identity and context."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value, request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let session = ctx.sessions.get(request.caller_session_id).await?;

        Ok(ToolOutput::text(format!(
            "Session ID: {}\nType: {}\nStatus: {}",
            session.id, session.session_type, session.status
        ))
        .with_field("session_id", session.id.to_string())
        .with_field("session_type", session.session_type.to_string())
        .with_field("status", session.status.to_string())
        .with_field(
            "project_id",
            session.project_id.map_or(Value::Null, |p| Value::String(p.to_string())),
        )
        .with_field("context", serde_json::to_value(&session.context).unwrap_or(Value::Null)))
    }
}

//! `contact_instance` — send a message to another instance in the same project.
//!
//! Grounded on `original_source`'s `pm_management.py::contact_instance`: look
//! up both sessions, reject cross-project targets, enqueue fire-and-forget
//! (the enqueuer itself performs the target's `idle → working` transition).

use async_trait::async_trait;
use conclave_core::SessionId;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

/// `contact_instance(target_instance_id, message)`.
pub struct ContactInstanceTool;

#[async_trait]
impl InstanceTool for ContactInstanceTool {
    fn name(&self) -> &'static str {
        "contact_instance"
    }

    fn description(&self) -> &'static str {
        "Send a message to another agent instance in this project."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "target_instance_id": { "type": "string", "description": "UUID of the instance to message" },
                "message": { "type": "string", "description": "Message content to send" },
            },
            "required": ["target_instance_id", "message"],
        })
    }

    async fn execute(&self, args: Value, request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        deliver(args, request, ctx).await
    }
}

/// Shared body, also used by [`crate::contact_pm::ContactPmTool`] once it has
/// resolved a target.
pub(crate) async fn deliver(args: Value, request: &RequestContext, ctx: &ToolContext) -> ToolResult {
    let target_raw = args
        .get("target_instance_id")
        .and_then(Value::as_str)
        .ok_or(ToolError::MissingArgument("target_instance_id"))?;
    let message = args
        .get("message")
        .and_then(Value::as_str)
        .ok_or(ToolError::MissingArgument("message"))?;
    if message.is_empty() {
        return Err(ToolError::MissingArgument("message"));
    }

    let target_uuid = uuid::Uuid::parse_str(target_raw)
        .map_err(|e| ToolError::InvalidArgument(format!("invalid target_instance_id: {e}")))?;
    let target_id = SessionId::from_uuid(target_uuid);

    send_to(target_id, message, request, ctx).await
}

pub(crate) async fn send_to(
    target_id: SessionId,
    message: &str,
    request: &RequestContext,
    ctx: &ToolContext,
) -> ToolResult {
    let caller_project = request.require_project()?;

    let target = ctx
        .sessions
        .get(target_id)
        .await
        .map_err(|_| ToolError::SessionNotFound(target_id))?;

    let target_project = target.project_id.ok_or(ToolError::CrossProject(target_id, caller_project))?;
    if target_project != caller_project {
        return Err(ToolError::CrossProject(target_id, caller_project));
    }

    ctx.enqueuer
        .enqueue(
            target_id,
            message.to_string(),
            request.caller_agent_id.clone(),
            Some(request.caller_display_name.clone()),
            Some(request.caller_session_id),
        )
        .await?;

    tracing::info!(
        from = %request.caller_session_id,
        to = %target_id,
        "contact_instance delivered"
    );

    let preview: String = message.chars().take(100).collect();
    let ellipsis = if message.chars().count() > 100 { "..." } else { "" };
    Ok(ToolOutput::text(format!(
        "✓ Message sent to instance {target_id}\n\nMessage: {preview}{ellipsis}\n\n\
         The message has been queued for delivery and will be processed by the target instance."
    ))
    .with_field("source_instance_id", request.caller_session_id.to_string())
    .with_field("target_instance_id", target_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx_with, fake_request};

    #[tokio::test]
    async fn rejects_missing_message() {
        let (ctx, _) = ctx_with(vec![], vec![]);
        let req = fake_request();
        let args = serde_json::json!({ "target_instance_id": SessionId::new().to_string() });
        let err = ContactInstanceTool.execute(args, &req, &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument("message")));
    }

    #[tokio::test]
    async fn rejects_invalid_uuid() {
        let (ctx, _) = ctx_with(vec![], vec![]);
        let req = fake_request();
        let args = serde_json::json!({ "target_instance_id": "not-a-uuid", "message": "hi" });
        let err = ContactInstanceTool.execute(args, &req, &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}

//! `remind` — schedule a delayed self-message.
//!
//! Grounded on `spec.md` §4.7: after `delay_seconds`, transition the caller
//! back to `working` and enqueue `message` to itself with sender
//! `"System Reminder"`. The delay itself runs as a detached task (see
//! [`crate::context::BackgroundSpawner`]) — the tool call returns immediately,
//! matching the "enqueue never waits for execution" suspension-point model.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

const MIN_DELAY_SECONDS: u64 = 1;
const MAX_DELAY_SECONDS: u64 = 86_400;
const REMINDER_SENDER: &str = "System Reminder";

/// `remind(delay_seconds, message)`.
pub struct RemindTool;

#[async_trait]
impl InstanceTool for RemindTool {
    fn name(&self) -> &'static str {
        "remind"
    }

    fn description(&self) -> &'static str {
        "Schedule a reminder message to be delivered to yourself after a delay, \
         between 1 second and 24 hours."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "delay_seconds": { "type": "integer", "description": "Delay before delivery, 1-86400 seconds" },
                "message": { "type": "string", "description": "Reminder text" },
            },
            "required": ["delay_seconds", "message"],
        })
    }

    async fn execute(&self, args: Value, request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let delay_seconds = args
            .get("delay_seconds")
            .and_then(Value::as_u64)
            .ok_or(ToolError::MissingArgument("delay_seconds"))?;
        if !(MIN_DELAY_SECONDS..=MAX_DELAY_SECONDS).contains(&delay_seconds) {
            return Err(ToolError::InvalidArgument(format!(
                "delay_seconds must be between {MIN_DELAY_SECONDS} and {MAX_DELAY_SECONDS}, got {delay_seconds}"
            )));
        }
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .ok_or(ToolError::MissingArgument("message"))?
            .to_string();

        let session_id = request.caller_session_id;
        let enqueuer = ctx.enqueuer.clone();

        ctx.background.spawn(Box::pin(async move {
            tokio::time::sleep(Duration::from_secs(delay_seconds)).await;
            if let Err(error) = enqueuer
                .enqueue(session_id, message, None, Some(REMINDER_SENDER.to_string()), Some(session_id))
                .await
            {
                tracing::warn!(%session_id, %error, "reminder delivery failed");
            }
        }));

        Ok(ToolOutput::text(format!(
            "✓ Reminder scheduled in {delay_seconds}s"
        )))
    }
}

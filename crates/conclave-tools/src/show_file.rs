//! `show_file` — a display directive with no payload.
//!
//! Per `spec.md` §4.7: the UI treats the tool invocation itself (its
//! `path` argument, echoed back in the tool-call event) as the thing to
//! display; the tool's own response content is always empty.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

/// `show_file(path)`.
pub struct ShowFileTool;

#[async_trait]
impl InstanceTool for ShowFileTool {
    fn name(&self) -> &'static str {
        "show_file"
    }

    fn description(&self) -> &'static str {
        "Display a file to the user in the UI. Does not return file contents to the model."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path of the file to display" },
            },
            "required": ["path"],
        })
    }

    async fn execute(&self, args: Value, _request: &RequestContext, _ctx: &ToolContext) -> ToolResult {
        args.get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or(ToolError::MissingArgument("path"))?;
        Ok(ToolOutput::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fake_request;

    #[tokio::test]
    async fn returns_empty_content_on_success() {
        let (ctx, _) = crate::test_support::ctx_with(vec![], vec![]);
        let args = serde_json::json!({ "path": "/README.md" });
        let output = ShowFileTool.execute(args, &fake_request(), &ctx).await.unwrap().into_json();
        assert_eq!(output["content"][0]["text"], "");
    }

    #[tokio::test]
    async fn requires_a_path() {
        let (ctx, _) = crate::test_support::ctx_with(vec![], vec![]);
        let err = ShowFileTool.execute(Value::Null, &fake_request(), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingArgument("path")));
    }
}

//! `write_file` — write a file within the session's workspace, creating
//! parent directories as needed.

use async_trait::async_trait;
use serde_json::Value;

use super::resolve_within_root;
use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

/// Built-in `write_file` tool.
pub struct WriteFileTool;

#[async_trait]
impl InstanceTool for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Writes content to a file in the session's working directory, creating parent \
         directories and overwriting any existing file."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path relative to the workspace root" },
                "content": { "type": "string", "description": "Content to write" },
            },
            "required": ["path", "content"],
        })
    }

    async fn execute(&self, args: Value, request: &RequestContext, _ctx: &ToolContext) -> ToolResult {
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or(ToolError::MissingArgument("path"))?;
        let content = args.get("content").and_then(Value::as_str).ok_or(ToolError::MissingArgument("content"))?;

        let resolved = resolve_within_root(&request.workspace_root, path).await?;
        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&resolved, content).await?;

        Ok(ToolOutput::text(format!("Wrote {} bytes to {path}", content.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx_with, fake_request};

    #[tokio::test]
    async fn writes_and_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = fake_request();
        req.workspace_root = dir.path().to_path_buf();
        let (ctx, _) = ctx_with(vec![], vec![]);

        let args = serde_json::json!({ "path": "nested/out.txt", "content": "hello" });
        WriteFileTool.execute(args, &req, &ctx).await.unwrap();

        let written = tokio::fs::read_to_string(dir.path().join("nested/out.txt")).await.unwrap();
        assert_eq!(written, "hello");
    }

    #[tokio::test]
    async fn rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = fake_request();
        req.workspace_root = dir.path().to_path_buf();
        let (ctx, _) = ctx_with(vec![], vec![]);

        let args = serde_json::json!({ "path": "../escape.txt", "content": "x" });
        let err = WriteFileTool.execute(args, &req, &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::PathTraversal(_)));
    }
}

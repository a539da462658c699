//! `read_file` — read a file within the session's workspace (cat -n style).

use async_trait::async_trait;
use serde_json::Value;

use super::resolve_within_root;
use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

const DEFAULT_LINE_LIMIT: usize = 2000;

/// Built-in `read_file` tool.
pub struct ReadFileTool;

#[async_trait]
impl InstanceTool for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Reads a file from the session's working directory. Returns contents with \
         line numbers (cat -n format). Default reads up to 2000 lines."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path relative to the workspace root" },
                "offset": { "type": "integer", "description": "1-based line to start from" },
                "limit": { "type": "integer", "description": "Number of lines to read" },
            },
            "required": ["path"],
        })
    }

    async fn execute(&self, args: Value, request: &RequestContext, _ctx: &ToolContext) -> ToolResult {
        let path = args
            .get("path")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or(ToolError::MissingArgument("path"))?;
        let offset = args.get("offset").and_then(Value::as_u64).map(|o| o as usize);
        let limit = args.get("limit").and_then(Value::as_u64).map_or(DEFAULT_LINE_LIMIT, |l| l as usize);

        let resolved = resolve_within_root(&request.workspace_root, path).await?;
        let content = tokio::fs::read_to_string(&resolved).await?;

        let lines: Vec<&str> = content.lines().collect();
        let start = offset.map_or(0, |o| o.saturating_sub(1));
        let end = start.saturating_add(limit).min(lines.len());

        if start >= lines.len() {
            return Ok(ToolOutput::text(format!("(file has {} lines, offset {start} is past end)", lines.len())));
        }

        let mut text = String::new();
        for (idx, line) in lines[start..end].iter().enumerate() {
            text.push_str(&format!("{:>6}\t{}\n", start + idx + 1, line));
        }
        Ok(ToolOutput::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx_with, fake_request};

    #[tokio::test]
    async fn reads_with_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("f.txt"), "a\nb\nc\n").await.unwrap();
        let mut req = fake_request();
        req.workspace_root = dir.path().to_path_buf();
        let (ctx, _) = ctx_with(vec![], vec![]);

        let args = serde_json::json!({ "path": "f.txt" });
        let output = ReadFileTool.execute(args, &req, &ctx).await.unwrap().into_json();
        let text = output["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("1\ta"));
        assert!(text.contains("3\tc"));
    }

    #[tokio::test]
    async fn rejects_paths_outside_the_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = fake_request();
        req.workspace_root = dir.path().to_path_buf();
        let (ctx, _) = ctx_with(vec![], vec![]);

        let args = serde_json::json!({ "path": "../../etc/passwd" });
        let err = ReadFileTool.execute(args, &req, &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::PathTraversal(_)));
    }
}

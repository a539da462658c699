//! `grep` — search file contents in the session's workspace by regex.
//!
//! Not present in the retrieved `astrid-tools` subset; built in its idiom
//! (`BuiltinTool`, `walkdir` traversal, truncated output) from the
//! `grep` entry in `common_tools.py`'s tool list.

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use walkdir::WalkDir;

use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

const MAX_MATCHES: usize = 500;

/// Built-in `grep` tool.
pub struct GrepTool;

#[async_trait]
impl InstanceTool for GrepTool {
    fn name(&self) -> &'static str {
        "grep"
    }

    fn description(&self) -> &'static str {
        "Searches file contents in the session's working directory for a regex pattern. \
         Returns matching lines as \"path:line: text\"."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Regex pattern to search for" },
                "glob": { "type": "string", "description": "Only search files whose relative path contains this substring" },
            },
            "required": ["pattern"],
        })
    }

    async fn execute(&self, args: Value, request: &RequestContext, _ctx: &ToolContext) -> ToolResult {
        let pattern = args
            .get("pattern")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .ok_or(ToolError::MissingArgument("pattern"))?;
        let path_filter = args.get("glob").and_then(Value::as_str);

        let regex = Regex::new(pattern).map_err(|e| ToolError::InvalidArgument(format!("invalid regex: {e}")))?;

        let root = request.workspace_root.clone();
        let mut hits = Vec::new();

        'walk: for entry in WalkDir::new(&root).follow_links(false).into_iter().filter_entry(|e| {
            e.depth() == 0 || e.file_name().to_str().is_none_or(|s| !s.starts_with('.'))
        }) {
            let Ok(entry) = entry else { continue };
            if entry.file_type().is_dir() {
                continue;
            }
            let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path()).display().to_string();
            if let Some(filter) = path_filter {
                if !rel.contains(filter) {
                    continue;
                }
            }
            let Ok(content) = tokio::fs::read_to_string(entry.path()).await else { continue };
            for (line_no, line) in content.lines().enumerate() {
                if regex.is_match(line) {
                    hits.push(format!("{rel}:{}: {line}", line_no + 1));
                    if hits.len() >= MAX_MATCHES {
                        break 'walk;
                    }
                }
            }
        }

        if hits.is_empty() {
            return Ok(ToolOutput::text(format!("No matches for '{pattern}'")));
        }
        Ok(ToolOutput::text(hits.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx_with, fake_request};

    #[tokio::test]
    async fn finds_matching_lines() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.txt"), "hello\nworld\nhello again\n").await.unwrap();

        let mut req = fake_request();
        req.workspace_root = dir.path().to_path_buf();
        let (ctx, _) = ctx_with(vec![], vec![]);

        let args = serde_json::json!({ "pattern": "hello" });
        let output = GrepTool.execute(args, &req, &ctx).await.unwrap().into_json();
        let text = output["content"][0]["text"].as_str().unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.contains("a.txt:1: hello"));
    }

    #[tokio::test]
    async fn invalid_regex_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut req = fake_request();
        req.workspace_root = dir.path().to_path_buf();
        let (ctx, _) = ctx_with(vec![], vec![]);

        let args = serde_json::json!({ "pattern": "(unclosed" });
        let err = GrepTool.execute(args, &req, &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }
}

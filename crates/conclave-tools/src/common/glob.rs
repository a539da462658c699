//! `glob` — find files in the session's workspace matching a glob pattern.
//!
//! Grounded on `astrid-tools::GlobTool`, scoped to
//! [`crate::context::RequestContext::workspace_root`] instead of an
//! arbitrary search directory.

use std::time::SystemTime;

use async_trait::async_trait;
use globset::GlobBuilder;
use serde_json::Value;
use walkdir::WalkDir;

use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

/// Built-in `glob` tool.
pub struct GlobTool;

#[async_trait]
impl InstanceTool for GlobTool {
    fn name(&self) -> &'static str {
        "glob"
    }

    fn description(&self) -> &'static str {
        "Finds files matching a glob pattern (e.g. \"**/*.rs\") in the session's working \
         directory, sorted by modification time (most recent first)."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Glob pattern to match" },
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

        let matcher = GlobBuilder::new(pattern)
            .literal_separator(false)
            .build()
            .map_err(|e| ToolError::InvalidArgument(format!("invalid glob pattern: {e}")))?
            .compile_matcher();

        let root = request.workspace_root.clone();
        let mut matches: Vec<(String, SystemTime)> = Vec::new();

        for entry in WalkDir::new(&root).follow_links(false).into_iter().filter_entry(|e| {
            e.depth() == 0 || e.file_name().to_str().is_none_or(|s| !s.starts_with('.'))
        }) {
            let Ok(entry) = entry else { continue };
            if entry.file_type().is_dir() {
                continue;
            }
            let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            if !matcher.is_match(rel) {
                continue;
            }
            let modified = entry.metadata().and_then(|m| m.modified()).unwrap_or(SystemTime::UNIX_EPOCH);
            matches.push((rel.display().to_string(), modified));
        }

        matches.sort_by(|a, b| b.1.cmp(&a.1));

        if matches.is_empty() {
            return Ok(ToolOutput::text(format!("No files matching '{pattern}'")));
        }
        let text = matches.into_iter().map(|(path, _)| path).collect::<Vec<_>>().join("\n");
        Ok(ToolOutput::text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx_with, fake_request};

    #[tokio::test]
    async fn finds_matching_files_relative_to_workspace_root() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("a.rs"), "").await.unwrap();
        tokio::fs::create_dir(dir.path().join("sub")).await.unwrap();
        tokio::fs::write(dir.path().join("sub/b.rs"), "").await.unwrap();
        tokio::fs::write(dir.path().join("c.txt"), "").await.unwrap();

        let mut req = fake_request();
        req.workspace_root = dir.path().to_path_buf();
        let (ctx, _) = ctx_with(vec![], vec![]);

        let args = serde_json::json!({ "pattern": "**/*.rs" });
        let output = GlobTool.execute(args, &req, &ctx).await.unwrap().into_json();
        let text = output["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("a.rs"));
        assert!(text.contains("sub/b.rs") || text.contains("sub\\b.rs"));
        assert!(!text.contains("c.txt"));
    }
}

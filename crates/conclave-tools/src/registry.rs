//! Registry of in-process tools, generalizing `astrid-tools::ToolRegistry`
//! from a flat lookup table to one that also owns the dispatch boundary
//! where a [`ToolError`](crate::error::ToolError) becomes the `"✗ Error: ..."`
//! wire payload instead of propagating.

use std::collections::HashMap;

use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

/// Looks up and dispatches [`InstanceTool`]s by name.
pub struct ToolRegistry {
    tools: HashMap<&'static str, Box<dyn InstanceTool>>,
}

impl ToolRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    /// A registry with every built-in inter-session and `common` tool
    /// registered. `agent_assistant`/`skill_assistant` editing tools are not
    /// included — the Session Builder registers those only for sessions of
    /// the matching type.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::contact_instance::ContactInstanceTool));
        registry.register(Box::new(crate::contact_pm::ContactPmTool));
        registry.register(Box::new(crate::spawn_instance::SpawnInstanceTool));
        registry.register(Box::new(crate::list_team_members::ListTeamMembersTool));
        registry.register(Box::new(crate::get_session_info::GetSessionInfoTool));
        registry.register(Box::new(crate::remind::RemindTool));
        registry.register(Box::new(crate::show_file::ShowFileTool));
        registry.register(Box::new(crate::common::ReadFileTool));
        registry.register(Box::new(crate::common::WriteFileTool));
        registry.register(Box::new(crate::common::GlobTool));
        registry.register(Box::new(crate::common::GrepTool));
        registry
    }

    /// Register a tool, or replace one already registered under the same name.
    pub fn register(&mut self, tool: Box<dyn InstanceTool>) {
        self.tools.insert(tool.name(), tool);
    }

    /// `true` if a tool with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Every registered tool name, for the Session Builder's allow-list checks.
    #[must_use]
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.tools.keys().copied().collect()
    }

    /// Execute `name` with `args`, returning the wire-shaped JSON response
    /// regardless of success or failure — a [`ToolError`](crate::error::ToolError)
    /// becomes `{"content": [{"type": "text", "text": "✗ Error: ..."}]}`
    /// rather than propagating, mirroring the originals' blanket
    /// `except Exception: return _error(...)`.
    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        request: &RequestContext,
        ctx: &ToolContext,
    ) -> Value {
        let Some(tool) = self.tools.get(name) else {
            return ToolOutput::error(format!("unknown tool '{name}'"));
        };
        match tool.execute(args, request, ctx).await {
            Ok(output) => output.into_json(),
            Err(err) => {
                tracing::warn!(tool = name, error = %err, "tool call failed");
                ToolOutput::error(err)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_every_spec_tool() {
        let registry = ToolRegistry::with_defaults();
        for name in [
            "contact_instance",
            "contact_pm",
            "spawn_instance",
            "list_team_members",
            "get_session_info",
            "remind",
            "show_file",
            "read_file",
            "write_file",
            "glob",
            "grep",
        ] {
            assert!(registry.contains(name), "missing tool: {name}");
        }
    }

    #[test]
    fn unknown_tool_name_is_not_registered() {
        let registry = ToolRegistry::with_defaults();
        assert!(!registry.contains("nonexistent"));
    }
}

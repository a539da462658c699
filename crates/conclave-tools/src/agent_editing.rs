//! `agent_assistant` tool server: `init_agent`, `list_agents`, `validate_agent`.
//!
//! Bound only for sessions of type `agent_assistant` per the Session
//! Builder's tool-server table; grounded on
//! `original_source/backend/app/infrastructure/mcp/servers/agent_assistant_tools.py`.
//! `update_agent_body`-style editing is handled by the session's own
//! `write_file`/`edit_file` tools against the `CLAUDE.md` path this module
//! hands back, exactly as the original's docstring instructs ("edit using
//! the Write or Edit tool").

use async_trait::async_trait;
use conclave_repos::Agent;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

fn slugify(name: &str) -> String {
    let mut slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect();
    while slug.contains("--") {
        slug = slug.replace("--", "-");
    }
    slug.trim_matches('-').to_string()
}

/// `init_agent(agent_name)`.
pub struct InitAgentTool;

#[async_trait]
impl InstanceTool for InitAgentTool {
    fn name(&self) -> &'static str {
        "init_agent"
    }

    fn description(&self) -> &'static str {
        "Initialize a new AI agent with a template CLAUDE.md file that you can then edit."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "agent_name": { "type": "string" } },
            "required": ["agent_name"],
        })
    }

    async fn execute(&self, args: Value, _request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let agent_name = args
            .get("agent_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ToolError::MissingArgument("agent_name"))?;

        let agent_id = slugify(agent_name);
        if agent_id.is_empty() {
            return Err(ToolError::InvalidArgument(
                "agent_name must contain at least some alphanumeric characters".to_string(),
            ));
        }
        if ctx.agents.exists(&agent_id).await? {
            return Err(ToolError::InvalidArgument(format!("agent '{agent_id}' already exists")));
        }

        let created = ctx.agents.create(Agent::new(&agent_id, agent_name)).await?;

        Ok(ToolOutput::text(format!(
            "✓ Agent template created successfully\n\n\
             **Agent ID:** {agent_id}\n**Agent Name:** {agent_name}\n**Path:** {path}\n\n\
             Edit the CLAUDE.md file to customize tags, skills, allowed_tools, allowed_mcps, \
             and the body content, then use validate_agent to check your work.",
            path = created.file_path,
        ))
        .with_field("agent_id", agent_id)
        .with_field("path", created.file_path))
    }
}

/// `list_agents()`.
pub struct ListAgentsTool;

#[async_trait]
impl InstanceTool for ListAgentsTool {
    fn name(&self) -> &'static str {
        "list_agents"
    }

    fn description(&self) -> &'static str {
        "List all available AI agents with their configurations."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value, _request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let agents = ctx.agents.get_all().await?;
        if agents.is_empty() {
            return Ok(ToolOutput::text("No agents found. Use init_agent to create one."));
        }

        let mut text = format!("**Agents ({}):**\n\n", agents.len());
        for agent in &agents {
            let description = agent.description.as_deref().unwrap_or("No description");
            text.push_str(&format!("• **({}) {}:** {description}\n", agent.id, agent.name));
        }
        Ok(ToolOutput::text(text))
    }
}

/// `validate_agent(agent_id)`.
pub struct ValidateAgentTool;

#[async_trait]
impl InstanceTool for ValidateAgentTool {
    fn name(&self) -> &'static str {
        "validate_agent"
    }

    fn description(&self) -> &'static str {
        "Validate an agent's configuration and check for issues."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "agent_id": { "type": "string" } },
            "required": ["agent_id"],
        })
    }

    async fn execute(&self, args: Value, _request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let agent_id = args
            .get("agent_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ToolError::MissingArgument("agent_id"))?;

        let agent = ctx.agents.get_by_id(agent_id).await?.ok_or_else(|| {
            ToolError::InvalidArgument(format!("agent '{agent_id}' not found"))
        })?;

        let mut warnings = Vec::new();
        for skill_id in &agent.skills {
            if ctx.skills.get_by_id(skill_id).await?.is_none() {
                warnings.push(format!("Skill '{skill_id}' not found"));
            }
        }
        if !agent.icon_color.starts_with('#') {
            warnings.push("'icon_color' should be a hex color code (e.g., '#904AE2')".to_string());
        }

        let mut text = format!("✓ Validation complete for agent '{agent_id}'\n\n");
        if warnings.is_empty() {
            text.push_str("✓ No issues found. Agent configuration is valid.\n\n");
        } else {
            text.push_str("**⚠️ Warnings:**\n");
            for warning in &warnings {
                text.push_str(&format!("  - {warning}\n"));
            }
            text.push('\n');
        }
        text.push_str(&format!(
            "**Configuration Summary:**\n- Name: {}\n- Skills: {} skill(s)\n- Allowed Tools: {} tool(s)\n- Allowed MCPs: {} MCP(s)\n",
            agent.name,
            agent.skills.len(),
            agent.allowed_tools.len(),
            agent.allowed_mcps.len(),
        ));

        Ok(ToolOutput::text(text)
            .with_field("valid", true)
            .with_field("warnings", Value::Array(warnings.into_iter().map(Value::String).collect())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ctx_with_agents, fake_request};

    #[tokio::test]
    async fn init_agent_slugifies_the_name() {
        let ctx = ctx_with_agents(vec![]);
        let args = serde_json::json!({ "agent_name": "Research Analyst!" });
        let output = InitAgentTool.execute(args, &fake_request(), &ctx).await.unwrap().into_json();
        assert_eq!(output["agent_id"], "research-analyst");
    }

    #[tokio::test]
    async fn init_agent_rejects_duplicates() {
        let ctx = ctx_with_agents(vec![Agent::new("x", "X")]);
        let args = serde_json::json!({ "agent_name": "X" });
        let err = InitAgentTool.execute(args, &fake_request(), &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn validate_agent_flags_missing_skill() {
        let mut agent = Agent::new("x", "X");
        agent.skills = vec!["missing-skill".to_string()];
        let ctx = ctx_with_agents(vec![agent]);

        let args = serde_json::json!({ "agent_id": "x" });
        let output = ValidateAgentTool.execute(args, &fake_request(), &ctx).await.unwrap().into_json();
        assert_eq!(output["warnings"].as_array().unwrap().len(), 1);
    }
}

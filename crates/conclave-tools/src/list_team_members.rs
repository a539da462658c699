//! `list_team_members` — PM-only: the project's assigned specialists.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::error::ToolResult;
use crate::output::ToolOutput;
use crate::tool::InstanceTool;

/// `list_team_members()`.
pub struct ListTeamMembersTool;

#[async_trait]
impl InstanceTool for ListTeamMembersTool {
    fn name(&self) -> &'static str {
        "list_team_members"
    }

    fn description(&self) -> &'static str {
        "View available team members assigned to the current project."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value, request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        request.require_pm()?;
        let project_id = request.require_project()?;
        let project = ctx.projects.get(project_id).await?;

        if project.team_member_ids.is_empty() {
            return Ok(ToolOutput::text(
                "No team members assigned to this project yet.\n\n\
                 Use the project settings to assign agents to this project.",
            ));
        }

        let mut members = Vec::new();
        for agent_id in &project.team_member_ids {
            if let Some(agent) = ctx.agents.get_by_id(agent_id.as_str()).await? {
                members.push(agent);
            }
        }

        if members.is_empty() {
            return Ok(ToolOutput::text("No valid team members found (agents may have been deleted)."));
        }

        let mut text = format!("**Team Members ({}):**\n\n", members.len());
        for member in &members {
            let description = member.description.as_deref().unwrap_or("No description");
            text.push_str(&format!("• **({}) {}:** {description}\n", member.id, member.name));
        }

        let members_json: Vec<Value> = members
            .iter()
            .map(|a| {
                serde_json::json!({
                    "id": a.id,
                    "name": a.name,
                    "description": a.description.clone().unwrap_or_else(|| "No description".to_string()),
                })
            })
            .collect();

        Ok(ToolOutput::text(text).with_field("team_members", Value::Array(members_json)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::test_support::{ctx_with, fake_project, fake_request};
    use conclave_repos::{Agent, AgentRepository};

    #[tokio::test]
    async fn lists_resolved_team_members() {
        let mut project = fake_project("Acme");
        project.team_member_ids = vec![conclave_core::AgentId::new("backend-dev")];
        let mut req = fake_request();
        req.caller_project_id = Some(project.id);

        let (ctx, _) = ctx_with(vec![], vec![project]);
        ctx.agents.create(Agent::new("backend-dev", "Backend Dev")).await.unwrap();

        let output = ListTeamMembersTool.execute(Value::Null, &req, &ctx).await.unwrap().into_json();
        assert_eq!(output["team_members"][0]["id"], "backend-dev");
    }

    #[tokio::test]
    async fn empty_team_gets_a_friendly_message_not_an_error() {
        let project = fake_project("Acme");
        let mut req = fake_request();
        req.caller_project_id = Some(project.id);
        let (ctx, _) = ctx_with(vec![], vec![project]);

        let output = ListTeamMembersTool.execute(Value::Null, &req, &ctx).await.unwrap().into_json();
        assert!(output["content"][0]["text"].as_str().unwrap().contains("No team members"));
    }

    #[tokio::test]
    async fn rejects_non_pm_callers() {
        let project = fake_project("Acme");
        let mut req = fake_request();
        req.caller_project_id = Some(project.id);
        req.caller_session_type = conclave_core::SessionType::Specialist;
        let (ctx, _) = ctx_with(vec![], vec![project]);

        let err = ListTeamMembersTool.execute(Value::Null, &req, &ctx).await.unwrap_err();
        assert!(matches!(err, ToolError::PmOnly));
    }
}

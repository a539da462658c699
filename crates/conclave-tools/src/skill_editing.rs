//! `skill_assistant` tool server: `init_skill`, `list_skills`, `validate_skill`.
//!
//! Bound only for sessions of type `skill_assistant` per the Session
//! Builder's tool-server table; grounded on
//! `original_source/backend/app/infrastructure/mcp/servers/skill_assistant_tools.py`.

use async_trait::async_trait;
use conclave_repos::Skill;
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

/// `init_skill(skill_name)`.
pub struct InitSkillTool;

#[async_trait]
impl InstanceTool for InitSkillTool {
    fn name(&self) -> &'static str {
        "init_skill"
    }

    fn description(&self) -> &'static str {
        "Initialize a new skill with a template SKILL.md file that you can then edit."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "skill_name": { "type": "string" } },
            "required": ["skill_name"],
        })
    }

    async fn execute(&self, args: Value, _request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let skill_name = args
            .get("skill_name")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ToolError::MissingArgument("skill_name"))?;

        let skill_id = slugify(skill_name);
        if skill_id.is_empty() {
            return Err(ToolError::InvalidArgument(
                "skill_name must contain at least some alphanumeric characters".to_string(),
            ));
        }
        if ctx.skills.get_by_id(&skill_id).await?.is_some() {
            return Err(ToolError::InvalidArgument(format!("skill '{skill_id}' already exists")));
        }

        let created = ctx.skills.create(Skill::new(&skill_id, skill_name)).await?;

        Ok(ToolOutput::text(format!(
            "✓ Skill template created successfully\n\n\
             **Skill ID:** {skill_id}\n**Skill Name:** {skill_name}\n**Path:** {path}\n\n\
             Edit the SKILL.md file to customize description, tags, icon, iconColor, \
             and the body content, then use validate_skill to check your work.",
            path = created.file_path,
        ))
        .with_field("skill_id", skill_id)
        .with_field("path", created.file_path))
    }
}

/// `list_skills()`.
pub struct ListSkillsTool;

#[async_trait]
impl InstanceTool for ListSkillsTool {
    fn name(&self) -> &'static str {
        "list_skills"
    }

    fn description(&self) -> &'static str {
        "List all available skills with their configurations."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: Value, _request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let skills = ctx.skills.get_all().await?;
        if skills.is_empty() {
            return Ok(ToolOutput::text("No skills found. Use init_skill to create one."));
        }

        let mut text = format!("**Skills ({}):**\n\n", skills.len());
        for skill in &skills {
            text.push_str(&format!("• **({}) {}:** {}\n", skill.id, skill.name, skill.description));
        }
        Ok(ToolOutput::text(text))
    }
}

/// `validate_skill(skill_id)`.
pub struct ValidateSkillTool;

#[async_trait]
impl InstanceTool for ValidateSkillTool {
    fn name(&self) -> &'static str {
        "validate_skill"
    }

    fn description(&self) -> &'static str {
        "Validate a skill's configuration and check for issues."
    }

    fn input_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "skill_id": { "type": "string" } },
            "required": ["skill_id"],
        })
    }

    async fn execute(&self, args: Value, _request: &RequestContext, ctx: &ToolContext) -> ToolResult {
        let skill_id = args
            .get("skill_id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(ToolError::MissingArgument("skill_id"))?;

        let skill = ctx.skills.get_by_id(skill_id).await?.ok_or_else(|| {
            ToolError::InvalidArgument(format!("skill '{skill_id}' not found"))
        })?;
        let content = ctx.skills.load_skill_content(skill_id).await?;
        let body = content.splitn(3, "---\n").nth(2).unwrap_or(&content).trim();

        let mut issues = Vec::new();
        let mut warnings = Vec::new();

        if skill.name.is_empty() {
            issues.push("Missing required field: 'name'".to_string());
        }
        if skill.description.is_empty() {
            warnings.push("Missing 'description' field".to_string());
        } else if skill.description.len() < 20 {
            warnings.push("Description is very short. Consider adding more detail.".to_string());
        }
        if !skill.icon_color.starts_with('#') {
            warnings.push("'iconColor' should be a hex color code (e.g., '#904AE2')".to_string());
        }
        if body.len() < 100 {
            warnings.push("Skill content is very short. Consider adding more detailed documentation.".to_string());
        }
        if body.contains('[') && body.contains(']') {
            warnings.push(
                "Content contains template placeholders like '[...]'. Consider replacing them with actual content."
                    .to_string(),
            );
        }

        let mut text = format!("✓ Validation complete for skill '{skill_id}'\n\n");
        if !issues.is_empty() {
            text.push_str("**❌ Issues Found:**\n");
            for issue in &issues {
                text.push_str(&format!("  - {issue}\n"));
            }
            text.push('\n');
        }
        if !warnings.is_empty() {
            text.push_str("**⚠️ Warnings:**\n");
            for warning in &warnings {
                text.push_str(&format!("  - {warning}\n"));
            }
            text.push('\n');
        }
        if issues.is_empty() && warnings.is_empty() {
            text.push_str("✓ No issues found. Skill configuration is valid.\n\n");
        }
        text.push_str(&format!(
            "**Configuration Summary:**\n- Name: {}\n- Tags: {} tag(s)\n- Icon: {} ({})\n- Content Length: {} characters\n",
            skill.name,
            skill.tags.len(),
            skill.icon,
            skill.icon_color,
            body.len(),
        ));

        Ok(ToolOutput::text(text)
            .with_field("valid", issues.is_empty())
            .with_field("issues", Value::Array(issues.into_iter().map(Value::String).collect()))
            .with_field("warnings", Value::Array(warnings.into_iter().map(Value::String).collect())))
    }
}

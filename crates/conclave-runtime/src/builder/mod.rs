//! Session Builder: turns a session's row and its agent/skill context into a
//! ready-to-spawn [`ClientConfig`] plus a per-session [`HookRegistry`].
//!
//! Grounded on `astrid-runtime`'s `config_bridge` module, which performs the
//! same job (translate domain configuration into the lower layer's launch
//! config) for subagent spawns.

mod templates;

use std::path::PathBuf;

use conclave_core::{AgentId, ProjectId, SessionId, SessionType};
use conclave_hooks::{HookRegistry, PreToolUseHook};
use conclave_llm::ClientConfig;
use conclave_repos::{Agent, AgentRepository, SkillRepository};
use conclave_tools::ToolRegistry;

use crate::error::RuntimeResult;

/// Base file-operation tools every session type starts from, before its
/// type-specific tool-server tools are unioned in.
const FILE_OP_TOOLS: &[&str] = &["read_file", "write_file", "glob", "grep"];

/// Tools common to every session type regardless of its tool-server grouping:
/// the cross-session primitives that don't require PM privilege, plus the
/// file-operation tools.
const COMMON_TOOLS: &[&str] =
    &["read_file", "write_file", "glob", "grep", "contact_pm", "get_session_info", "remind", "show_file"];

/// PM-exclusive inter-session management tools.
pub const PM_MANAGEMENT_TOOLS: &[&str] = &["contact_instance", "spawn_instance", "list_team_members"];

const AGENT_ASSISTANT_TOOLS: &[&str] = &["init_agent", "list_agents", "validate_agent"];
const SKILL_ASSISTANT_TOOLS: &[&str] = &["init_skill", "list_skills", "validate_skill"];

/// How many skills' descriptions get previewed in the assembled system
/// prompt, and how long each preview is truncated to.
const MAX_SKILL_PREVIEWS: usize = 20;
const SKILL_PREVIEW_CHARS: usize = 500;

const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Everything the Session Builder needs to know about the session it is
/// building a client configuration for.
#[derive(Debug, Clone)]
pub struct BuildInput {
    /// The session's own id (used only for log correlation).
    pub session_id: SessionId,
    /// The session's archetype, driving the template/tool-server table.
    pub session_type: SessionType,
    /// The agent bound to this session, if any (all but `assistant` types
    /// that opt out typically have one).
    pub agent_id: Option<AgentId>,
    /// The project this session belongs to, if any.
    pub project_id: Option<ProjectId>,
    /// Working directory for the subprocess.
    pub working_dir: PathBuf,
    /// Display names of the project's other team members, for the PM
    /// template's `{specialists}` placeholder. Empty for non-PM sessions.
    pub team_member_names: Vec<String>,
    /// External session id to resume, if this is a reconnect rather than a
    /// fresh session.
    pub resume_session_id: Option<String>,
    /// Optional free-text user profile appended as the prompt's last
    /// section.
    pub user_profile: Option<String>,
}

/// What the Session Builder hands back: a launch-ready client config and the
/// hooks that should run before every tool dispatch on this session.
pub struct BuildOutput {
    /// Ready to pass to [`conclave_llm::AgentClient::connect`] via a client
    /// factory.
    pub config: ClientConfig,
    /// Per-session `PreToolUse` hooks (non-empty only for `pm` sessions).
    pub hooks: HookRegistry,
}

/// Builds [`ClientConfig`]s from session rows, per the per-type rule table:
/// base tools, extra tool-server tools, prompt template, and (for PM
/// sessions only) the project-scoping hook.
pub struct SessionBuilder {
    agent_command: String,
    agent_args: Vec<String>,
    agents: std::sync::Arc<dyn AgentRepository>,
    skills: std::sync::Arc<dyn SkillRepository>,
    tool_registry: std::sync::Arc<ToolRegistry>,
}

impl SessionBuilder {
    /// `agent_command`/`agent_args` describe how to exec the downstream
    /// agent CLI; `tool_registry` is consulted only to validate tool names,
    /// never to dispatch through.
    pub fn new(
        agent_command: impl Into<String>,
        agent_args: Vec<String>,
        agents: std::sync::Arc<dyn AgentRepository>,
        skills: std::sync::Arc<dyn SkillRepository>,
        tool_registry: std::sync::Arc<ToolRegistry>,
    ) -> Self {
        Self { agent_command: agent_command.into(), agent_args, agents, skills, tool_registry }
    }

    /// Assemble a [`BuildOutput`] for `input`.
    pub async fn build(&self, input: BuildInput) -> RuntimeResult<BuildOutput> {
        let agent = match &input.agent_id {
            Some(agent_id) => self.agents.get_by_id(agent_id.as_str()).await?,
            None => None,
        };

        let allowed_tools = self.compose_allowed_tools(input.session_type, agent.as_ref());
        let prompt = self.assemble_prompt(&input, agent.as_ref()).await?;

        let mut config = ClientConfig::new(self.agent_command.clone())
            .with_cwd(input.working_dir.clone())
            .with_system_prompt(prompt)
            .with_allowed_tools(allowed_tools);
        config.args = self.agent_args.clone();
        if let Some(agent) = &agent {
            config.model = Some(agent.default_model.clone());
        }
        if let Some(resume) = input.resume_session_id {
            config = config.with_resume_session_id(resume);
        }

        let mut hooks = HookRegistry::new();
        if input.session_type == SessionType::Pm {
            if let Some(project_id) = input.project_id {
                hooks.register(PreToolUseHook::pm_project_id(project_id.to_string()));
            }
        }

        Ok(BuildOutput { config, hooks })
    }

    /// Same inputs, forcing a fresh connection (`resume_session_id: None`),
    /// for the Session Executor's one-shot resume-failure retry.
    pub async fn build_without_resume(&self, mut input: BuildInput) -> RuntimeResult<BuildOutput> {
        input.resume_session_id = None;
        self.build(input).await
    }

    fn compose_allowed_tools(&self, session_type: SessionType, agent: Option<&Agent>) -> Vec<String> {
        fn push_all(tools: &[&str], names: &mut Vec<String>) {
            for &t in tools {
                if !names.iter().any(|n| n == t) {
                    names.push(t.to_string());
                }
            }
        }

        let mut names: Vec<String> = Vec::new();
        match session_type {
            SessionType::Pm => {
                push_all(FILE_OP_TOOLS, &mut names);
                push_all(PM_MANAGEMENT_TOOLS, &mut names);
                push_all(COMMON_TOOLS, &mut names);
            }
            SessionType::Specialist => {
                if let Some(agent) = agent {
                    for tool in &agent.allowed_tools {
                        if self.tool_registry.contains(tool) {
                            if !names.iter().any(|n| n == tool) {
                                names.push(tool.clone());
                            }
                        } else {
                            tracing::warn!(tool, "specialist's allowed_tools names an unknown tool; dropping");
                        }
                    }
                    for mcp in &agent.allowed_mcps {
                        names.push(format!("mcp__{mcp}"));
                    }
                }
                push_all(COMMON_TOOLS, &mut names);
            }
            SessionType::Assistant => {
                push_all(FILE_OP_TOOLS, &mut names);
                push_all(COMMON_TOOLS, &mut names);
            }
            SessionType::AgentAssistant => {
                push_all(FILE_OP_TOOLS, &mut names);
                push_all(AGENT_ASSISTANT_TOOLS, &mut names);
                push_all(COMMON_TOOLS, &mut names);
            }
            SessionType::SkillAssistant => {
                push_all(FILE_OP_TOOLS, &mut names);
                push_all(SKILL_ASSISTANT_TOOLS, &mut names);
                push_all(COMMON_TOOLS, &mut names);
            }
        }
        names
    }

    async fn assemble_prompt(&self, input: &BuildInput, agent: Option<&Agent>) -> RuntimeResult<String> {
        let mut sections = Vec::new();

        if let Some(agent) = agent {
            match self.agents.load_agent_content(&agent.id).await {
                Ok(content) => sections.push(content),
                Err(err) => {
                    tracing::warn!(agent_id = %agent.id, %err, "failed to load agent body for prompt");
                }
            }
        }

        let base_template = match input.session_type {
            SessionType::Pm => templates::PM_TEMPLATE,
            SessionType::Specialist => templates::SPECIALIST_TEMPLATE,
            SessionType::Assistant => templates::ASSISTANT_TEMPLATE,
            SessionType::AgentAssistant => templates::AGENT_ASSISTANT_TEMPLATE,
            SessionType::SkillAssistant => templates::SKILL_ASSISTANT_TEMPLATE,
        };
        let tools = self.compose_allowed_tools(input.session_type, agent).join(", ");
        let specialists = if input.team_member_names.is_empty() {
            "(no teammates yet)".to_string()
        } else {
            input.team_member_names.join(", ")
        };
        sections.push(templates::render(base_template, &tools, &specialists));

        let skills = self.skills.get_all().await?;
        if !skills.is_empty() {
            let mut preview = String::from("Available skills:\n\n");
            for skill in skills.iter().take(MAX_SKILL_PREVIEWS) {
                let truncated: String = skill.description.chars().take(SKILL_PREVIEW_CHARS).collect();
                preview.push_str(&format!("- **{}**: {}\n", skill.name, truncated));
            }
            if skills.len() > MAX_SKILL_PREVIEWS {
                tracing::debug!(
                    total = skills.len(),
                    shown = MAX_SKILL_PREVIEWS,
                    "skill preview list truncated"
                );
            }
            sections.push(preview);
        }

        if let Some(profile) = &input.user_profile {
            sections.push(profile.clone());
        }

        Ok(sections.join(SECTION_SEPARATOR))
    }
}

//! File-backed `Agent` repository.
//!
//! Agents are directories following the Claude SDK convention:
//!
//! ```text
//! {base_path}/{agent-id}/
//! ├── CLAUDE.md   (YAML frontmatter + markdown body)
//! └── docs/       (optional supporting documents)
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};
use crate::frontmatter::{self, FieldValue};

const CLAUDE_MD: &str = "CLAUDE.md";
const DELETED_SUFFIX: &str = ".deleted";
const DEFAULT_MODEL: &str = "sonnet";
const DEFAULT_ICON_COLOR: &str = "#4A90E2";

/// An agent definition: identity, model preference, and tool/skill allow-lists.
///
/// `id` is the agent's directory name (a slug), not a generated identifier —
/// agents are authored by hand and referenced by this name everywhere else
/// in the system (session context, tool arguments, project team lists).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Directory-name slug, e.g. `backend-dev`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Optional one-line description.
    pub description: Option<String>,
    /// Logical path exposed to clients, e.g. `/agents/backend-dev/`.
    pub file_path: String,
    /// Preferred model; omitted from the frontmatter when it's `"sonnet"`.
    pub default_model: String,
    /// Free-form classification tags.
    pub tags: Vec<String>,
    /// Skill ids this agent has access to.
    pub skills: Vec<String>,
    /// Built-in tool names this agent may invoke.
    pub allowed_tools: Vec<String>,
    /// MCP server names this agent may invoke.
    pub allowed_mcps: Vec<String>,
    /// UI accent color.
    pub icon_color: String,
}

impl Agent {
    /// Construct a new agent with the repository's defaults for everything
    /// not explicitly provided.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            file_path: format!("/agents/{id}/"),
            id,
            name: name.into(),
            description: None,
            default_model: DEFAULT_MODEL.to_string(),
            tags: Vec::new(),
            skills: Vec::new(),
            allowed_tools: Vec::new(),
            allowed_mcps: Vec::new(),
            icon_color: DEFAULT_ICON_COLOR.to_string(),
        }
    }
}

/// CRUD access to file-backed agent definitions.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Create a new agent directory and `CLAUDE.md`.
    async fn create(&self, agent: Agent) -> RepoResult<Agent>;

    /// Fetch an agent by id. Returns `None` for unknown or soft-deleted ids.
    async fn get_by_id(&self, agent_id: &str) -> RepoResult<Option<Agent>>;

    /// Fetch an agent by display name (case-insensitive).
    async fn get_by_name(&self, name: &str) -> RepoResult<Option<Agent>>;

    /// List all non-deleted agents.
    async fn get_all(&self) -> RepoResult<Vec<Agent>>;

    /// Update an existing agent's frontmatter, preserving its markdown body.
    async fn update(&self, agent: Agent) -> RepoResult<Agent>;

    /// Soft-delete an agent by renaming its directory with a `.deleted` suffix.
    async fn delete(&self, agent_id: &str) -> RepoResult<()>;

    /// `true` if an agent exists, including soft-deleted ones.
    async fn exists(&self, agent_id: &str) -> RepoResult<bool>;

    /// Load the full `CLAUDE.md` text, for injection into a session's system prompt.
    async fn load_agent_content(&self, agent_id: &str) -> RepoResult<String>;

    /// Load a supporting document from inside the agent's own directory.
    async fn load_supporting_doc(&self, agent_id: &str, doc_path: &str) -> RepoResult<String>;
}

/// Filesystem-backed [`AgentRepository`].
pub struct FileAgentRepository {
    base_path: PathBuf,
}

impl FileAgentRepository {
    /// Open (creating if absent) a repository rooted at `base_path`.
    ///
    /// # Errors
    ///
    /// Returns [`RepoError::Io`] if `base_path` cannot be created.
    pub async fn new(base_path: impl Into<PathBuf>) -> RepoResult<Self> {
        let base_path = base_path.into();
        tokio::fs::create_dir_all(&base_path).await?;
        Ok(Self { base_path })
    }

    fn dir_for(&self, agent_id: &str) -> PathBuf {
        self.base_path.join(agent_id)
    }

    fn deleted_dir_for(&self, agent_id: &str) -> PathBuf {
        self.base_path.join(format!("{agent_id}{DELETED_SUFFIX}"))
    }

    async fn parse_agent(agent_id: &str, dir: &Path) -> RepoResult<Agent> {
        let claude_md = dir.join(CLAUDE_MD);
        let content = tokio::fs::read_to_string(&claude_md).await?;
        let parsed = frontmatter::parse(&content, &claude_md.display().to_string())?;

        let name = frontmatter::field_as_string(&parsed.fields, "name").ok_or_else(|| {
            RepoError::InvalidFrontmatter {
                path: claude_md.display().to_string(),
                reason: "missing required field 'name'".to_string(),
            }
        })?;

        Ok(Agent {
            id: agent_id.to_string(),
            name,
            description: frontmatter::field_as_string(&parsed.fields, "description"),
            file_path: format!("/agents/{agent_id}/"),
            default_model: frontmatter::field_as_string(&parsed.fields, "default_model")
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            tags: frontmatter::field_as_list(&parsed.fields, "tags"),
            skills: frontmatter::field_as_list(&parsed.fields, "skills"),
            allowed_tools: frontmatter::field_as_list(&parsed.fields, "allowed_tools"),
            allowed_mcps: frontmatter::field_as_list(&parsed.fields, "allowed_mcps"),
            icon_color: frontmatter::field_as_string(&parsed.fields, "icon_color")
                .unwrap_or_else(|| DEFAULT_ICON_COLOR.to_string()),
        })
    }

    fn render_frontmatter(agent: &Agent, body: &str) -> String {
        let mut fields: Vec<(&str, FieldValue)> = vec![
            ("name", FieldValue::Str(agent.name.clone())),
            ("tags", FieldValue::List(agent.tags.clone())),
            ("skills", FieldValue::List(agent.skills.clone())),
            ("allowed_tools", FieldValue::List(agent.allowed_tools.clone())),
            ("allowed_mcps", FieldValue::List(agent.allowed_mcps.clone())),
            ("icon_color", FieldValue::Str(agent.icon_color.clone())),
        ];
        if let Some(description) = &agent.description {
            fields.push(("description", FieldValue::Str(description.clone())));
        }
        if agent.default_model != DEFAULT_MODEL {
            fields.push(("default_model", FieldValue::Str(agent.default_model.clone())));
        }
        frontmatter::render(&fields, body)
    }

    fn default_body(agent: &Agent) -> String {
        let skills = if agent.skills.is_empty() {
            String::new()
        } else {
            agent
                .skills
                .iter()
                .map(|s| format!("- {s}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let tools = if agent.allowed_tools.is_empty() {
            String::new()
        } else {
            agent
                .allowed_tools
                .iter()
                .map(|t| format!("- {t}"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        format!(
            "\n# {name}\n\nDescribe the agent's role and responsibilities here.\n\n\
## Role Description\n\nProvide a detailed description of what this agent does and when to use it.\n\n\
## Responsibilities\n\n- Responsibility 1\n- Responsibility 2\n- Responsibility 3\n\n\
## Communication Style\n\nDescribe how this agent communicates (formal, casual, technical, etc.)\n\n\
## Skills\n\nThis agent has access to the following skills:\n{skills}\n\n\
## Tools & Capabilities\n\nAllowed tools:\n{tools}\n\n\
## Notes\n\nAdd any additional notes, warnings, or tips here.\n",
            name = agent.name,
        )
    }
}

#[async_trait]
impl AgentRepository for FileAgentRepository {
    async fn create(&self, mut agent: Agent) -> RepoResult<Agent> {
        let dir = self.dir_for(&agent.id);
        if dir.exists() {
            return Err(RepoError::AlreadyExists(agent.id.clone()));
        }
        tokio::fs::create_dir_all(&dir).await?;
        let body = Self::default_body(&agent);
        let content = Self::render_frontmatter(&agent, &body);
        tokio::fs::write(dir.join(CLAUDE_MD), content).await?;
        agent.file_path = format!("/agents/{}/", agent.id);
        tracing::info!(agent_id = %agent.id, "agent created");
        Ok(agent)
    }

    async fn get_by_id(&self, agent_id: &str) -> RepoResult<Option<Agent>> {
        let dir = self.dir_for(agent_id);
        if !dir.join(CLAUDE_MD).exists() {
            return Ok(None);
        }
        Ok(Some(Self::parse_agent(agent_id, &dir).await?))
    }

    async fn get_by_name(&self, name: &str) -> RepoResult<Option<Agent>> {
        let name_lower = name.trim().to_lowercase();
        let agents = self.get_all().await?;
        Ok(agents.into_iter().find(|a| a.name.to_lowercase() == name_lower))
    }

    async fn get_all(&self) -> RepoResult<Vec<Agent>> {
        let mut agents = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().to_string();
            if dir_name.ends_with(DELETED_SUFFIX) {
                continue;
            }
            let dir = entry.path();
            if !dir.join(CLAUDE_MD).exists() {
                continue;
            }
            agents.push(Self::parse_agent(&dir_name, &dir).await?);
        }
        Ok(agents)
    }

    async fn update(&self, agent: Agent) -> RepoResult<Agent> {
        let dir = self.dir_for(&agent.id);
        let claude_md = dir.join(CLAUDE_MD);
        if !claude_md.exists() {
            return Err(RepoError::NotFound(agent.id.clone()));
        }
        let existing = tokio::fs::read_to_string(&claude_md).await?;
        let body = frontmatter::parse(&existing, &claude_md.display().to_string())?.body;
        let content = Self::render_frontmatter(&agent, &body);
        tokio::fs::write(&claude_md, content).await?;
        tracing::info!(agent_id = %agent.id, "agent updated");
        Ok(agent)
    }

    async fn delete(&self, agent_id: &str) -> RepoResult<()> {
        let dir = self.dir_for(agent_id);
        if !dir.exists() {
            return Err(RepoError::NotFound(agent_id.to_string()));
        }
        tokio::fs::rename(&dir, self.deleted_dir_for(agent_id)).await?;
        tracing::info!(agent_id, "agent deleted");
        Ok(())
    }

    async fn exists(&self, agent_id: &str) -> RepoResult<bool> {
        Ok(self.dir_for(agent_id).join(CLAUDE_MD).exists()
            || self.deleted_dir_for(agent_id).join(CLAUDE_MD).exists())
    }

    async fn load_agent_content(&self, agent_id: &str) -> RepoResult<String> {
        let claude_md = self.dir_for(agent_id).join(CLAUDE_MD);
        if !claude_md.exists() {
            return Err(RepoError::NotFound(agent_id.to_string()));
        }
        Ok(tokio::fs::read_to_string(claude_md).await?)
    }

    async fn load_supporting_doc(&self, agent_id: &str, doc_path: &str) -> RepoResult<String> {
        let dir = self.dir_for(agent_id);
        if !dir.exists() {
            return Err(RepoError::NotFound(agent_id.to_string()));
        }
        let resolved = dir.join(doc_path);
        let canonical_dir = tokio::fs::canonicalize(&dir).await?;
        let canonical_doc = match tokio::fs::canonicalize(&resolved).await {
            Ok(p) => p,
            Err(_) => return Err(RepoError::NotFound(doc_path.to_string())),
        };
        if !canonical_doc.starts_with(&canonical_dir) {
            return Err(RepoError::PathTraversal(doc_path.to_string()));
        }
        Ok(tokio::fs::read_to_string(canonical_doc).await?)
    }
}

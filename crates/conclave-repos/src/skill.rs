//! File-backed `Skill` repository.
//!
//! Skills are directories following the Claude SDK convention:
//!
//! ```text
//! {base_path}/{skill-id}/
//! ├── SKILL.md      (YAML frontmatter + markdown body)
//! ├── examples.md   (optional)
//! └── scripts/      (optional)
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RepoError, RepoResult};
use crate::frontmatter::{self, FieldValue};

const SKILL_MD: &str = "SKILL.md";
const DELETED_SUFFIX: &str = ".deleted";
const DEFAULT_ICON: &str = "zap";
const DEFAULT_ICON_COLOR: &str = "#4A90E2";

/// A skill definition: a reusable capability description agents can reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    /// Directory-name slug, e.g. `database-query`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description shown in skill pickers.
    pub description: String,
    /// Logical path exposed to clients, e.g. `/skills/database-query/`.
    pub file_path: String,
    /// Free-form classification tags.
    pub tags: Vec<String>,
    /// UI icon name.
    pub icon: String,
    /// UI accent color.
    pub icon_color: String,
}

impl Skill {
    /// Construct a new skill with the repository's defaults for everything
    /// not explicitly provided.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            file_path: format!("/skills/{id}/"),
            id,
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            icon: DEFAULT_ICON.to_string(),
            icon_color: DEFAULT_ICON_COLOR.to_string(),
        }
    }
}

/// CRUD access to file-backed skill definitions.
#[async_trait]
pub trait SkillRepository: Send + Sync {
    /// Create a new skill directory and `SKILL.md`.
    async fn create(&self, skill: Skill) -> RepoResult<Skill>;

    /// Fetch a skill by id. Returns `None` for unknown or soft-deleted ids.
    async fn get_by_id(&self, skill_id: &str) -> RepoResult<Option<Skill>>;

    /// List all non-deleted skills.
    async fn get_all(&self) -> RepoResult<Vec<Skill>>;

    /// Update an existing skill's frontmatter, preserving its markdown body.
    async fn update(&self, skill: Skill) -> RepoResult<Skill>;

    /// Soft-delete a skill by renaming its directory with a `.deleted` suffix.
    async fn delete(&self, skill_id: &str) -> RepoResult<()>;

    /// Load the full `SKILL.md` text, for injection into a session's system prompt.
    async fn load_skill_content(&self, skill_id: &str) -> RepoResult<String>;
}

/// Filesystem-backed [`SkillRepository`].
pub struct FileSkillRepository {
    base_path: PathBuf,
}

impl FileSkillRepository {
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

    fn dir_for(&self, skill_id: &str) -> PathBuf {
        self.base_path.join(skill_id)
    }

    fn deleted_dir_for(&self, skill_id: &str) -> PathBuf {
        self.base_path.join(format!("{skill_id}{DELETED_SUFFIX}"))
    }

    async fn parse_skill(skill_id: &str, dir: &std::path::Path) -> RepoResult<Skill> {
        let skill_md = dir.join(SKILL_MD);
        let content = tokio::fs::read_to_string(&skill_md).await?;
        let parsed = frontmatter::parse(&content, &skill_md.display().to_string())?;

        let name = frontmatter::field_as_string(&parsed.fields, "name").ok_or_else(|| {
            RepoError::InvalidFrontmatter {
                path: skill_md.display().to_string(),
                reason: "missing required field 'name'".to_string(),
            }
        })?;

        Ok(Skill {
            id: skill_id.to_string(),
            name,
            description: frontmatter::field_as_string(&parsed.fields, "description")
                .unwrap_or_default(),
            file_path: format!("/skills/{skill_id}/"),
            tags: frontmatter::field_as_list(&parsed.fields, "tags"),
            icon: frontmatter::field_as_string(&parsed.fields, "icon")
                .unwrap_or_else(|| DEFAULT_ICON.to_string()),
            icon_color: frontmatter::field_as_string(&parsed.fields, "iconColor")
                .unwrap_or_else(|| DEFAULT_ICON_COLOR.to_string()),
        })
    }

    fn render_frontmatter(skill: &Skill, body: &str) -> String {
        let fields: Vec<(&str, FieldValue)> = vec![
            ("name", FieldValue::Str(skill.name.clone())),
            ("description", FieldValue::Str(skill.description.clone())),
            ("tags", FieldValue::List(skill.tags.clone())),
            ("icon", FieldValue::Str(skill.icon.clone())),
            ("iconColor", FieldValue::Str(skill.icon_color.clone())),
        ];
        frontmatter::render(&fields, body)
    }

    fn default_body(skill: &Skill) -> String {
        format!(
            "\n# {name}\n\n{description}\n\n\
## Overview\n\nProvide a detailed overview of what this skill does and when to use it.\n\n\
## Usage\n\nExplain how to use this skill effectively. Include examples if helpful.\n\n\
### Examples\n\n```\nAdd code examples or usage patterns here\n```\n\n\
## Prerequisites\n\nList any requirements or setup needed:\n- Requirement 1\n- Requirement 2\n\n\
## Best Practices\n\n- Best practice 1\n- Best practice 2\n\n\
## Notes\n\nAdd any additional notes, warnings, or tips here.\n",
            name = skill.name,
            description = skill.description,
        )
    }
}

#[async_trait]
impl SkillRepository for FileSkillRepository {
    async fn create(&self, mut skill: Skill) -> RepoResult<Skill> {
        let dir = self.dir_for(&skill.id);
        if dir.exists() {
            return Err(RepoError::AlreadyExists(skill.id.clone()));
        }
        tokio::fs::create_dir_all(&dir).await?;
        let body = Self::default_body(&skill);
        let content = Self::render_frontmatter(&skill, &body);
        tokio::fs::write(dir.join(SKILL_MD), content).await?;
        skill.file_path = format!("/skills/{}/", skill.id);
        tracing::info!(skill_id = %skill.id, "skill created");
        Ok(skill)
    }

    async fn get_by_id(&self, skill_id: &str) -> RepoResult<Option<Skill>> {
        let dir = self.dir_for(skill_id);
        if !dir.join(SKILL_MD).exists() {
            return Ok(None);
        }
        Ok(Some(Self::parse_skill(skill_id, &dir).await?))
    }

    async fn get_all(&self) -> RepoResult<Vec<Skill>> {
        let mut skills = Vec::new();
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
            if !dir.join(SKILL_MD).exists() {
                continue;
            }
            skills.push(Self::parse_skill(&dir_name, &dir).await?);
        }
        Ok(skills)
    }

    async fn update(&self, skill: Skill) -> RepoResult<Skill> {
        let dir = self.dir_for(&skill.id);
        let skill_md = dir.join(SKILL_MD);
        if !skill_md.exists() {
            return Err(RepoError::NotFound(skill.id.clone()));
        }
        let existing = tokio::fs::read_to_string(&skill_md).await?;
        let body = frontmatter::parse(&existing, &skill_md.display().to_string())?.body;
        let content = Self::render_frontmatter(&skill, &body);
        tokio::fs::write(&skill_md, content).await?;
        tracing::info!(skill_id = %skill.id, "skill updated");
        Ok(skill)
    }

    async fn delete(&self, skill_id: &str) -> RepoResult<()> {
        let dir = self.dir_for(skill_id);
        if !dir.exists() {
            return Err(RepoError::NotFound(skill_id.to_string()));
        }
        tokio::fs::rename(&dir, self.deleted_dir_for(skill_id)).await?;
        tracing::info!(skill_id, "skill deleted");
        Ok(())
    }

    async fn load_skill_content(&self, skill_id: &str) -> RepoResult<String> {
        let skill_md = self.dir_for(skill_id).join(SKILL_MD);
        if !skill_md.exists() {
            return Err(RepoError::NotFound(skill_id.to_string()));
        }
        Ok(tokio::fs::read_to_string(skill_md).await?)
    }
}

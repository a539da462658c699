//! Default on-disk locations for agent/skill storage.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Default base directory for agent definitions: `~/.conclave/agents`.
///
/// Falls back to `./.conclave/agents` on platforms where a home directory
/// cannot be determined.
#[must_use]
pub fn default_agents_dir() -> PathBuf {
    conclave_dir().join("agents")
}

/// Default base directory for skill definitions: `~/.conclave/skills`.
#[must_use]
pub fn default_skills_dir() -> PathBuf {
    conclave_dir().join("skills")
}

fn conclave_dir() -> PathBuf {
    ProjectDirs::from("", "", "conclave")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".conclave"))
}

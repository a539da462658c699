#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! File-backed Agent and Skill repositories.
//!
//! Agents and Skills are directories of hand-authored markdown with YAML
//! frontmatter (`CLAUDE.md`/`SKILL.md`). This crate owns parsing, writing,
//! and soft-deleting those directory trees; it never touches the database
//! (that's `conclave-storage`).

mod agent;
mod dirs;
mod error;
mod frontmatter;
mod skill;

pub use agent::{Agent, AgentRepository, FileAgentRepository};
pub use dirs::{default_agents_dir, default_skills_dir};
pub use error::{RepoError, RepoResult};
pub use skill::{FileSkillRepository, Skill, SkillRepository};

//! In-process tool implementations available to agent sessions.
//!
//! Generalizes `astrid-tools`' flat `BuiltinTool` registry into one that
//! also carries the inter-session primitives (`contact_instance`,
//! `spawn_instance`, `remind`, ...) a multi-agent orchestration session
//! needs, dispatched against an explicit [`context::RequestContext`] rather
//! than a thread-local.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod agent_editing;
mod common;
pub mod contact_instance;
pub mod contact_pm;
pub mod context;
mod error;
pub mod get_session_info;
pub mod list_team_members;
mod output;
pub mod registry;
pub mod remind;
pub mod show_file;
pub mod skill_editing;
pub mod spawn_instance;
mod tool;

#[cfg(test)]
mod test_support;

pub use common::{GlobTool, GrepTool, ReadFileTool, WriteFileTool};
pub use context::{BackgroundSpawner, RequestContext, SessionEnqueuer, ToolContext, TokioBackgroundSpawner};
pub use error::{ToolError, ToolResult};
pub use output::ToolOutput;
pub use registry::ToolRegistry;
pub use tool::InstanceTool;

pub use agent_editing::{InitAgentTool, ListAgentsTool, ValidateAgentTool};
pub use contact_instance::ContactInstanceTool;
pub use contact_pm::ContactPmTool;
pub use get_session_info::GetSessionInfoTool;
pub use list_team_members::ListTeamMembersTool;
pub use remind::RemindTool;
pub use show_file::ShowFileTool;
pub use skill_editing::{InitSkillTool, ListSkillsTool, ValidateSkillTool};
pub use spawn_instance::SpawnInstanceTool;

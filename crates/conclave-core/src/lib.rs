#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Core domain types shared across the conclave workspace.
//!
//! Defines session/project/message identifiers, the session lifecycle state
//! machine, and the kanban-stage projection. No persistence or I/O lives
//! here — this crate is pure data and pure functions.

mod error;
mod ids;
mod session_type;
mod status;

pub use error::CoreError;
pub use ids::{AgentId, MessageId, ProjectId, SessionId};
pub use session_type::SessionType;
pub use status::{KanbanStage, SessionEvent, SessionStatus};

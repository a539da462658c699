#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! The Session Store: persisted `Session`/`Project`/`Message`/`ActivityLogEntry`
//! rows, backed by an embedded `SurrealDB`.
//!
//! This crate owns all database access for the workspace. Agent/Skill
//! repositories (file-backed, not database-backed) live in `conclave-repos`.

mod db;
mod entities;
mod error;
mod repository;
mod surreal;

pub use db::{surrealdb, Database};
pub use entities::{ActivityLogEntry, Message, MessageRole, Project, Session};
pub use error::{StorageError, StorageResult};
pub use repository::{ActivityLogRepository, MessageRepository, ProjectRepository, SessionRepository};
pub use surreal::{
    SurrealActivityLogRepository, SurrealMessageRepository, SurrealProjectRepository,
    SurrealSessionRepository,
};

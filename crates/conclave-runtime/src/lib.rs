#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! The Runtime: everything that turns a session row into a running agent
//! turn — Session Builder, Client Manager, Session Executor, and Project
//! Overlay.
//!
//! Every other crate in the workspace is a library of pure logic or a thin
//! I/O adapter; this is where they're assembled into the thing that
//! actually drives sessions end to end. No HTTP layer lives here — per
//! `spec.md` §6 it is a documented contract only — but [`SessionExecutor`]'s
//! public methods (`enqueue`, `interrupt`, `recreate`) are exactly what such
//! a layer would call.

mod builder;
mod client_manager;
mod error;
mod executor;
mod overlay;

pub use builder::{BuildInput, BuildOutput, SessionBuilder, PM_MANAGEMENT_TOOLS};
pub use client_manager::{is_resume_failure, AgentClientFactory, ClientManager, SubprocessClientFactory};
pub use error::{RuntimeError, RuntimeResult};
pub use executor::{SessionExecutor, TrackedSpawner};
pub use overlay::ProjectOverlay;

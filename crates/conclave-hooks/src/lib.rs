#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! `PreToolUse` argument-injection hooks.

mod error;
mod hook;

pub use error::HookError;
pub use hook::{HookRegistry, PreToolUseHook};

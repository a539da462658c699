#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! The Event Converter: a pure function from raw agent-subprocess messages
//! to the closed set of domain events the rest of the workspace consumes.

mod convert;
mod event;

pub use convert::convert;
pub use event::{Attribution, DomainEvent};

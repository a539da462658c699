#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! SSE Broadcast: per-session fan-out of domain events to zero or more
//! subscribers, with keepalive pings.
//!
//! The Session Executor is the sole publisher; everything else
//! (UI clients, the execute-query streaming endpoint) is a subscriber.
//! Wire formatting lives in [`sse`] so it can be tested independently of
//! any transport.

mod registry;
mod sse;

pub use registry::{BroadcastFrame, BroadcastRegistry, SubscriberStream};
pub use sse::{format_event, format_keepalive};

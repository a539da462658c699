#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Subprocess-driven agent client.
//!
//! No LLM is implemented in this crate. `SubprocessAgentClient` spawns an
//! external agent CLI and speaks newline-delimited JSON over its stdio,
//! yielding the raw polymorphic message shapes (`StreamEvent`,
//! `AssistantMessage`, `UserMessage`, `SystemMessage`, `ResultMessage`) that
//! `conclave-events` turns into domain events.
//!
//! ```no_run
//! use conclave_llm::{AgentClient, ClientConfig, SubprocessAgentClient};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("agent-cli").with_system_prompt("be helpful");
//! let client = SubprocessAgentClient::new(config);
//! client.connect().await?;
//! client.query("hello").await?;
//! while let Some(message) = client.receive_message().await? {
//!     println!("{message:?}");
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod types;

pub use client::{AgentClient, SubprocessAgentClient};
pub use config::{ClientConfig, ClientTimeouts, DEFAULT_CONNECT_TIMEOUT, DEFAULT_INACTIVITY_TIMEOUT};
pub use error::{ClientError, ClientResult};
pub use types::{AssistantMessage, ContentBlock, RawMessage, ResultMessage, StreamEvent, SystemMessage, UserMessage};

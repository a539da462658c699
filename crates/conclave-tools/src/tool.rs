//! The `InstanceTool` trait: an in-process tool callable by a session's LLM,
//! generalizing `astrid-tools::BuiltinTool` from single-process coding
//! operations to tools that call back into the Session Store and Executor.

use async_trait::async_trait;
use serde_json::Value;

use crate::context::{RequestContext, ToolContext};
use crate::error::ToolResult;

/// A tool exposed to the LLM via the tool-server mechanism.
#[async_trait]
pub trait InstanceTool: Send + Sync {
    /// Tool name, as the LLM sees it.
    fn name(&self) -> &'static str;

    /// Human-readable description for the LLM's tool list.
    fn description(&self) -> &'static str;

    /// JSON schema for the tool's input arguments.
    fn input_schema(&self) -> Value;

    /// Execute the tool. `request` carries the calling session's resolved
    /// identity (see [`RequestContext`]); `ctx` carries the shared
    /// repositories and enqueuer.
    async fn execute(&self, args: Value, request: &RequestContext, ctx: &ToolContext) -> ToolResult;
}

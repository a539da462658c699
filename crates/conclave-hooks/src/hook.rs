//! `PreToolUse` hook: regex-match a tool name, inject fields into its call
//! arguments before dispatch.
//!
//! Scaled down from a general hook-handler system (command/HTTP/WASM/agent
//! handlers, fail actions, priorities) to the one shape this workspace
//! actually needs: an in-process argument mutator matched by tool name. The
//! canonical use is the Session Builder's PM hook, which injects the
//! session's `project_id` into every `pm_management__*` tool call so the PM
//! tool server never has to be told which project it's acting on.

use regex::Regex;
use serde_json::Value;

use crate::error::HookError;

/// A single `PreToolUse` hook: if `matcher` matches the tool name, every
/// `(key, value)` in `inject` is set on the call's argument object.
#[derive(Debug, Clone)]
pub struct PreToolUseHook {
    name: String,
    matcher: Regex,
    inject: Vec<(String, Value)>,
}

impl PreToolUseHook {
    /// Build a hook named `name` that matches tool names against `pattern`
    /// and injects `inject` fields into matched calls' arguments.
    ///
    /// # Errors
    ///
    /// Returns [`HookError::InvalidPattern`] if `pattern` is not a valid
    /// regex.
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        inject: Vec<(String, Value)>,
    ) -> Result<Self, HookError> {
        let matcher = Regex::new(pattern).map_err(|source| HookError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self { name: name.into(), matcher, inject })
    }

    /// The PM hook: injects `project_id` into every `pm_management__*` tool
    /// call, per the Session Builder's per-type rule table.
    ///
    /// # Panics
    ///
    /// Never — the pattern is a compile-time constant known to be valid.
    #[must_use]
    pub fn pm_project_id(project_id: impl Into<Value>) -> Self {
        Self::new(
            "pm_project_id",
            r".*pm_management__.*",
            vec![("project_id".to_string(), project_id.into())],
        )
        .expect("static PM hook pattern is always valid")
    }

    /// This hook's name, for logging.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply this hook to a tool call if its name matches. Returns `true` if
    /// the arguments were mutated.
    pub fn apply(&self, tool_name: &str, args: &mut Value) -> bool {
        if !self.matcher.is_match(tool_name) {
            return false;
        }
        if !args.is_object() {
            *args = Value::Object(serde_json::Map::new());
        }
        let map = args.as_object_mut().expect("just ensured args is an object");
        for (key, value) in &self.inject {
            map.insert(key.clone(), value.clone());
        }
        tracing::debug!(hook = %self.name, tool_name, "pre_tool_use hook applied");
        true
    }
}

/// An ordered set of [`PreToolUseHook`]s applied to every tool call before
/// dispatch.
#[derive(Debug, Clone, Default)]
pub struct HookRegistry {
    hooks: Vec<PreToolUseHook>,
}

impl HookRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a hook.
    pub fn register(&mut self, hook: PreToolUseHook) {
        self.hooks.push(hook);
    }

    /// Apply every matching hook to `args`, in registration order. Returns
    /// the number of hooks that matched and mutated the arguments.
    pub fn apply_all(&self, tool_name: &str, args: &mut Value) -> usize {
        self.hooks.iter().filter(|hook| hook.apply(tool_name, args)).count()
    }
}

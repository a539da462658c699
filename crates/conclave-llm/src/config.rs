//! Subprocess launch configuration.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Default time budget for `connect()` to complete, per the Client Manager
/// contract: connection must succeed or fail within 30 seconds.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default inactivity budget: if no message arrives on the stream for this
/// long, the Session Executor treats the session as errored.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Timeouts governing a client's lifecycle. Exposed as a plain config struct
/// (no file-watching loader — that's outside this workspace) so callers can
/// tune it without touching code.
#[derive(Debug, Clone, Copy)]
pub struct ClientTimeouts {
    /// Budget for `connect()`.
    pub connect: Duration,
    /// Budget for inactivity between messages on `receive_message()`.
    pub inactivity: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_CONNECT_TIMEOUT,
            inactivity: DEFAULT_INACTIVITY_TIMEOUT,
        }
    }
}

/// Everything needed to spawn and configure an agent subprocess.
///
/// Built by `conclave-runtime::builder::SessionBuilder`; this crate only
/// consumes it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Executable to spawn (e.g. the agent CLI binary).
    pub command: String,
    /// Arguments passed to `command`.
    pub args: Vec<String>,
    /// Working directory for the subprocess.
    pub cwd: Option<PathBuf>,
    /// Additional environment variables.
    pub env: HashMap<String, String>,
    /// Model identifier, if the subprocess accepts one.
    pub model: Option<String>,
    /// Rendered system prompt to pass to the subprocess.
    pub system_prompt: Option<String>,
    /// Tool names the subprocess is allowed to invoke.
    pub allowed_tools: Vec<String>,
    /// External session id to resume, if any.
    pub resume_session_id: Option<String>,
    /// Timeouts for this client.
    pub timeouts: ClientTimeouts,
}

impl ClientConfig {
    /// Start a config for `command`, with empty tool list and default
    /// timeouts.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            cwd: None,
            env: HashMap::new(),
            model: None,
            system_prompt: None,
            allowed_tools: Vec::new(),
            resume_session_id: None,
            timeouts: ClientTimeouts::default(),
        }
    }

    /// Builder: set the working directory.
    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Builder: set the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Builder: set the allowed tool list.
    #[must_use]
    pub fn with_allowed_tools(mut self, tools: Vec<String>) -> Self {
        self.allowed_tools = tools;
        self
    }

    /// Builder: set the resume token.
    #[must_use]
    pub fn with_resume_session_id(mut self, id: impl Into<String>) -> Self {
        self.resume_session_id = Some(id.into());
        self
    }
}

//! The subprocess-backed agent client.
//!
//! No LLM is implemented here — `SubprocessAgentClient` spawns an external
//! agent CLI and drives it over stdio, exactly as `ClaudeClient` in the
//! original backend wraps `ClaudeSDKClient`: a `connect()` with timeout
//! protection, a `query()`/`receive_message()` pair for the request/response
//! cycle, `interrupt()`, `is_alive()`, and session-id capture off the first
//! message.

use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin};
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::types::RawMessage;

/// A client that drives an agent subprocess.
///
/// Implementations are stored behind `Arc<dyn AgentClient>` in the Client
/// Manager's `DashMap<SessionId, _>`, so every method takes `&self`; the
/// subprocess handle and its pipes live behind internal locks.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Spawn the subprocess and wait for it to become ready.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::ConnectTimeout`] if this does not complete
    /// within `config.timeouts.connect`, or [`ClientError::ConnectionFailed`]
    /// if the subprocess cannot be spawned.
    async fn connect(&self) -> ClientResult<()>;

    /// Send a query to the subprocess.
    async fn query(&self, message: &str) -> ClientResult<()>;

    /// Read the next message from the subprocess's stdout, or `Ok(None)`
    /// once the stream ends (subprocess closed stdout).
    async fn receive_message(&self) -> ClientResult<Option<RawMessage>>;

    /// Interrupt the in-flight turn.
    ///
    /// Per the Client Manager contract, the subprocess is expected to enter
    /// a broken state after this — callers must `disconnect()` and recreate
    /// rather than reuse this client.
    async fn interrupt(&self) -> ClientResult<()>;

    /// Best-effort shutdown. Must not raise even if the subprocess already
    /// exited.
    async fn disconnect(&self) -> ClientResult<()>;

    /// Whether the subprocess is still running.
    fn is_alive(&self) -> bool;

    /// The external session id captured from the first message, if any.
    fn session_id(&self) -> Option<String>;
}

/// [`AgentClient`] backed by a real child process.
pub struct SubprocessAgentClient {
    config: ClientConfig,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    stdout: Mutex<Option<BufReader<tokio::process::ChildStdout>>>,
    session_id: Mutex<Option<String>>,
    alive: AtomicBool,
}

impl SubprocessAgentClient {
    /// Construct a client for `config`. Does not spawn anything yet —
    /// call [`AgentClient::connect`].
    #[must_use]
    pub fn new(config: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            stdout: Mutex::new(None),
            session_id: Mutex::new(None),
            alive: AtomicBool::new(false),
        })
    }

    fn build_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.config.command);
        cmd.args(&self.config.args);
        if let Some(cwd) = &self.config.cwd {
            cmd.current_dir(cwd);
        }
        for (key, value) in &self.config.env {
            cmd.env(key, value);
        }
        if let Some(model) = &self.config.model {
            cmd.env("CONCLAVE_AGENT_MODEL", model);
        }
        if let Some(prompt) = &self.config.system_prompt {
            cmd.env("CONCLAVE_SYSTEM_PROMPT", prompt);
        }
        if !self.config.allowed_tools.is_empty() {
            cmd.env("CONCLAVE_ALLOWED_TOOLS", self.config.allowed_tools.join(","));
        }
        if let Some(resume) = &self.config.resume_session_id {
            cmd.env("CONCLAVE_RESUME_SESSION_ID", resume);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd
    }

    async fn do_connect(&self) -> ClientResult<()> {
        let mut cmd = self.build_command();
        let mut child = cmd
            .spawn()
            .map_err(|e| ClientError::ConnectionFailed(e.to_string()))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ClientError::ConnectionFailed("no stdin pipe".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClientError::ConnectionFailed("no stdout pipe".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ClientError::ConnectionFailed("no stderr pipe".to_string()))?;

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::warn!(target: "conclave_llm::subprocess_stderr", "{line}");
            }
        });

        *self.child.lock().await = Some(child);
        *self.stdin.lock().await = Some(stdin);
        *self.stdout.lock().await = Some(BufReader::new(stdout));
        self.alive.store(true, Ordering::SeqCst);

        tracing::info!(command = %self.config.command, "agent subprocess connected");
        Ok(())
    }
}

#[async_trait]
impl AgentClient for SubprocessAgentClient {
    async fn connect(&self) -> ClientResult<()> {
        let timeout = self.config.timeouts.connect;
        match tokio::time::timeout(timeout, self.do_connect()).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::ConnectTimeout(timeout)),
        }
    }

    async fn query(&self, message: &str) -> ClientResult<()> {
        let mut guard = self.stdin.lock().await;
        let stdin = guard
            .as_mut()
            .ok_or_else(|| ClientError::QueryFailed("not connected".to_string()))?;

        let payload = serde_json::json!({
            "type": "user",
            "content": message,
        });
        let mut line = serde_json::to_vec(&payload).map_err(ClientError::Serialization)?;
        line.push(b'\n');

        stdin
            .write_all(&line)
            .await
            .map_err(|e| ClientError::QueryFailed(e.to_string()))?;
        stdin
            .flush()
            .await
            .map_err(|e| ClientError::QueryFailed(e.to_string()))?;

        tracing::debug!(message_len = message.len(), "query sent to agent subprocess");
        Ok(())
    }

    async fn receive_message(&self) -> ClientResult<Option<RawMessage>> {
        let mut guard = self.stdout.lock().await;
        let reader = guard
            .as_mut()
            .ok_or_else(|| ClientError::StreamingFailed("not connected".to_string()))?;

        let trimmed = loop {
            let mut line = String::new();
            let bytes_read = reader
                .read_line(&mut line)
                .await
                .map_err(|e| ClientError::StreamingFailed(e.to_string()))?;

            if bytes_read == 0 {
                self.alive.store(false, Ordering::SeqCst);
                return Ok(None);
            }
            if !line.trim().is_empty() {
                break line;
            }
        };
        let trimmed = trimmed.trim();

        let message: RawMessage = serde_json::from_str(trimmed)?;

        let not_yet_captured = self.session_id.lock().await.is_none();
        if not_yet_captured {
            if let Some(id) = message.session_id() {
                tracing::info!(session_id = %id, "external session id captured");
                *self.session_id.lock().await = Some(id.to_string());
            }
        }

        Ok(Some(message))
    }

    async fn interrupt(&self) -> ClientResult<()> {
        let mut guard = self.child.lock().await;
        let Some(child) = guard.as_mut() else {
            return Err(ClientError::InterruptFailed("not connected".to_string()));
        };

        // The subprocess is documented to enter a broken state after an
        // interrupt regardless of how it's delivered, so a hard kill here
        // is as good as a graceful signal — the caller must disconnect and
        // recreate rather than reuse this client either way.
        child
            .start_kill()
            .map_err(|e| ClientError::InterruptFailed(e.to_string()))?;

        tracing::info!("interrupt sent to agent subprocess");
        Ok(())
    }

    async fn disconnect(&self) -> ClientResult<()> {
        *self.stdin.lock().await = None;
        *self.stdout.lock().await = None;

        if let Some(mut child) = self.child.lock().await.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }

        self.alive.store(false, Ordering::SeqCst);
        tracing::info!("agent subprocess disconnected");
        Ok(())
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn session_id(&self) -> Option<String> {
        self.session_id.try_lock().ok().and_then(|g| g.clone())
    }
}

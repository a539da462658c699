//! Client Manager: owns the live [`AgentClient`] handles, one per session
//! with an active subprocess, and the resume-failure detection the Session
//! Executor's retry policy depends on.
//!
//! Grounded on `astrid_mcp`'s server/client lifecycle bookkeeping
//! (`ServerManager`), generalized from "one long-lived MCP server
//! connection" to "one agent subprocess per session, created lazily and torn
//! down on error, interrupt, or recreate".

use std::sync::Arc;
use std::sync::OnceLock;

use conclave_core::SessionId;
use conclave_llm::{AgentClient, ClientConfig, ClientError, SubprocessAgentClient};
use dashmap::DashMap;
use regex::Regex;

/// Builds an [`AgentClient`] from a [`ClientConfig`]. A trait so tests can
/// inject a fake client instead of spawning a real subprocess — the same
/// seam `conclave-tools` uses for `SessionEnqueuer`/`BackgroundSpawner`.
pub trait AgentClientFactory: Send + Sync {
    /// Construct (but do not connect) a client for `config`.
    fn create(&self, config: ClientConfig) -> Arc<dyn AgentClient>;
}

/// Default factory: spawns a real agent CLI subprocess.
#[derive(Default)]
pub struct SubprocessClientFactory;

impl AgentClientFactory for SubprocessClientFactory {
    fn create(&self, config: ClientConfig) -> Arc<dyn AgentClient> {
        SubprocessAgentClient::new(config)
    }
}

fn resume_failure_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)no conversation|conversation not found|exit code 1")
            .expect("static resume-failure pattern is always valid")
    })
}

/// `true` if `err` looks like a resume-token rejection rather than a genuine
/// connection failure — the signal the Session Executor's one-shot,
/// null-resume retry policy keys off.
#[must_use]
pub fn is_resume_failure(err: &ClientError) -> bool {
    resume_failure_pattern().is_match(&err.to_string())
}

/// Tracks one live client per session. Connection timeouts are enforced by
/// the client itself ([`ClientConfig::timeouts`]); this layer only owns the
/// map and the capture of the subprocess's own session id once it reports
/// one.
#[derive(Default)]
pub struct ClientManager {
    clients: DashMap<SessionId, Arc<dyn AgentClient>>,
}

impl ClientManager {
    /// Empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self { clients: DashMap::new() }
    }

    /// Build a client via `factory`, connect it, and register it under
    /// `session_id` on success. On failure nothing is registered.
    pub async fn create(
        &self,
        session_id: SessionId,
        factory: &dyn AgentClientFactory,
        config: ClientConfig,
    ) -> Result<Arc<dyn AgentClient>, ClientError> {
        let client = factory.create(config);
        client.connect().await?;
        self.clients.insert(session_id, client.clone());
        Ok(client)
    }

    /// The client currently registered for `session_id`, if any.
    #[must_use]
    pub fn get(&self, session_id: SessionId) -> Option<Arc<dyn AgentClient>> {
        self.clients.get(&session_id).map(|entry| entry.clone())
    }

    /// Disconnect (best-effort) and drop the client registered for
    /// `session_id`. A no-op if none is registered.
    pub async fn remove(&self, session_id: SessionId) {
        if let Some((_, client)) = self.clients.remove(&session_id) {
            if let Err(err) = client.disconnect().await {
                tracing::warn!(%session_id, %err, "client disconnect failed during removal");
            }
        }
    }

    /// Disconnect every registered client. Idempotent — intended for process
    /// shutdown.
    pub async fn shutdown(&self) {
        let sessions: Vec<SessionId> = self.clients.iter().map(|entry| *entry.key()).collect();
        for session_id in sessions {
            self.remove(session_id).await;
        }
    }

    /// `true` if `session_id` has a registered client that still reports
    /// itself alive.
    #[must_use]
    pub fn is_alive(&self, session_id: SessionId) -> bool {
        self.clients.get(&session_id).is_some_and(|entry| entry.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_resume_failure_messages() {
        assert!(is_resume_failure(&ClientError::ConnectionFailed("no conversation found".to_string())));
        assert!(is_resume_failure(&ClientError::ConnectionFailed("Conversation Not Found".to_string())));
        assert!(is_resume_failure(&ClientError::ConnectionFailed("process exited: exit code 1".to_string())));
        assert!(!is_resume_failure(&ClientError::ConnectionFailed("permission denied".to_string())));
    }

    #[tokio::test]
    async fn remove_on_unknown_session_is_a_no_op() {
        let manager = ClientManager::new();
        manager.remove(SessionId::new()).await;
        assert!(!manager.is_alive(SessionId::new()));
    }
}

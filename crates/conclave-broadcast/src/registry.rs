//! Per-session subscriber fan-out.

use std::time::Duration;

use conclave_core::SessionId;
use conclave_events::DomainEvent;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use uuid::Uuid;

use crate::sse::format_event;

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);

/// One item a [`SubscriberStream`] yields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastFrame {
    /// A real event, already formatted as an SSE frame.
    Event(String),
    /// A keepalive, emitted after 30s of silence.
    Keepalive,
}

/// The receiving half of a subscription, returned by
/// [`BroadcastRegistry::register`].
///
/// Dropping this automatically unregisters the subscriber on the next
/// `broadcast` to its session (delivery to a closed channel fails and the
/// registry drops it), matching the "drop on delivery error" policy.
pub struct SubscriberStream {
    rx: mpsc::UnboundedReceiver<String>,
    keepalive: tokio::time::Interval,
}

impl SubscriberStream {
    /// Wait for the next frame: a real event if one arrives within 30s,
    /// otherwise a keepalive.
    pub async fn next_frame(&mut self) -> BroadcastFrame {
        tokio::select! {
            biased;
            Some(frame) = self.rx.recv() => {
                self.keepalive.reset();
                BroadcastFrame::Event(frame)
            }
            _ = self.keepalive.tick() => BroadcastFrame::Keepalive,
        }
    }
}

struct Subscriber {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// `sessionId -> set<subscriber>`, the SSE Broadcast's registry.
///
/// The Session Executor is the sole publisher per session; subscribers are
/// zero or more UI clients plus (internally) the execute-query streaming
/// endpoint.
#[derive(Default)]
pub struct BroadcastRegistry {
    subscribers: DashMap<SessionId, Vec<Subscriber>>,
}

impl BroadcastRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber for `session_id`, returning its id (for
    /// later `unregister`) and the stream it should drain.
    pub fn register(&self, session_id: SessionId) -> (Uuid, SubscriberStream) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.entry(session_id).or_default().push(Subscriber { id, tx });

        let stream = SubscriberStream {
            rx,
            keepalive: interval_at(Instant::now() + KEEPALIVE_INTERVAL, KEEPALIVE_INTERVAL),
        };
        (id, stream)
    }

    /// Remove a subscriber by id.
    pub fn unregister(&self, session_id: SessionId, subscriber_id: Uuid) {
        if let Some(mut subscribers) = self.subscribers.get_mut(&session_id) {
            subscribers.retain(|s| s.id != subscriber_id);
        }
    }

    /// Broadcast `event` to every subscriber of `session_id`. Subscribers
    /// whose channel has closed are dropped.
    pub fn broadcast(&self, session_id: SessionId, event: &DomainEvent) {
        let Some(mut subscribers) = self.subscribers.get_mut(&session_id) else {
            return;
        };
        let frame = format_event(&session_id.to_string(), event);
        subscribers.retain(|s| s.tx.send(frame.clone()).is_ok());
    }

    /// Number of active subscribers for `session_id`.
    #[must_use]
    pub fn subscriber_count(&self, session_id: SessionId) -> usize {
        self.subscribers.get(&session_id).map_or(0, |s| s.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::format_keepalive;

    #[tokio::test]
    async fn broadcast_reaches_registered_subscriber() {
        let registry = BroadcastRegistry::new();
        let session_id = SessionId::new();
        let (_id, mut stream) = registry.register(session_id);

        registry.broadcast(session_id, &DomainEvent::MessageStart);

        match stream.next_frame().await {
            BroadcastFrame::Event(frame) => assert!(frame.starts_with("event: message_start")),
            BroadcastFrame::Keepalive => panic!("expected an event, not a keepalive"),
        }
    }

    #[tokio::test]
    async fn unregister_stops_delivery_and_future_sends_drop_it() {
        let registry = BroadcastRegistry::new();
        let session_id = SessionId::new();
        let (id, _stream) = registry.register(session_id);
        assert_eq!(registry.subscriber_count(session_id), 1);

        registry.unregister(session_id, id);
        assert_eq!(registry.subscriber_count(session_id), 0);
    }

    #[tokio::test]
    async fn dropped_receiver_is_pruned_on_next_broadcast() {
        let registry = BroadcastRegistry::new();
        let session_id = SessionId::new();
        let (_id, stream) = registry.register(session_id);
        drop(stream);

        registry.broadcast(session_id, &DomainEvent::MessageComplete);
        assert_eq!(registry.subscriber_count(session_id), 0);
    }

    #[tokio::test]
    async fn broadcast_to_unknown_session_is_a_no_op() {
        let registry = BroadcastRegistry::new();
        registry.broadcast(SessionId::new(), &DomainEvent::MessageStart);
    }

    #[tokio::test(start_paused = true)]
    async fn silence_produces_a_keepalive_after_30_seconds() {
        let registry = BroadcastRegistry::new();
        let session_id = SessionId::new();
        let (_id, mut stream) = registry.register(session_id);

        let frame = stream.next_frame().await;
        assert_eq!(frame, BroadcastFrame::Keepalive);
        assert_eq!(format_keepalive(), ": keepalive\n\n");
    }
}

//! Server-Sent Events wire formatting.

use conclave_events::DomainEvent;
use serde_json::Value;

/// Format `event` as one SSE frame: `event: <type>\ndata: <JSON>\n\n`.
///
/// `<JSON>` is the event's own serialization with `session_id` always
/// injected, so a client never has to track which stream a frame came from
/// separately from its payload.
#[must_use]
pub fn format_event(session_id: &str, event: &DomainEvent) -> String {
    let mut value = serde_json::to_value(event).expect("DomainEvent always serializes to JSON");
    let event_type = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    if let Value::Object(map) = &mut value {
        map.insert("session_id".to_string(), Value::String(session_id.to_string()));
    }

    format!("event: {event_type}\ndata: {value}\n\n")
}

/// A keepalive frame, emitted after 30s of subscriber silence.
///
/// An SSE comment line (leading `:`) is invisible to `EventSource`-style
/// clients but keeps intermediate proxies from closing the connection.
#[must_use]
pub fn format_keepalive() -> String {
    ": keepalive\n\n".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_start_formats_with_session_id() {
        let frame = format_event("sess-1", &DomainEvent::MessageStart);
        assert_eq!(frame, "event: message_start\ndata: {\"session_id\":\"sess-1\",\"type\":\"message_start\"}\n\n");
    }

    #[test]
    fn stream_delta_includes_its_own_fields_and_session_id() {
        let event = DomainEvent::StreamDelta { content_index: 3, text: "hi".to_string() };
        let frame = format_event("sess-2", &event);
        assert!(frame.starts_with("event: stream_delta\ndata: "));
        assert!(frame.contains("\"content_index\":3"));
        assert!(frame.contains("\"text\":\"hi\""));
        assert!(frame.contains("\"session_id\":\"sess-2\""));
        assert!(frame.ends_with("\n\n"));
    }

    #[test]
    fn keepalive_is_a_comment_line() {
        assert_eq!(format_keepalive(), ": keepalive\n\n");
    }
}

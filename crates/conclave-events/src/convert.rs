//! The Event Converter: a pure, deterministic map from raw subprocess
//! messages to domain events.

use conclave_llm::{AssistantMessage, ContentBlock, RawMessage};

use crate::event::{Attribution, DomainEvent};

/// Convert one raw subprocess message into zero or more domain events.
///
/// `attribution` is stamped onto any `ToolUse` events produced; callers pass
/// the issuing session's agent identity (the Session Executor knows this,
/// the subprocess protocol does not).
///
/// This function never errors: unrecognized shapes within a known message
/// type are logged and produce no events, matching the original converter's
/// "log and continue" behavior for forward-compatibility with stream event
/// shapes this converter doesn't yet know about.
#[must_use]
pub fn convert(raw: &RawMessage, attribution: &Attribution) -> Vec<DomainEvent> {
    match raw {
        RawMessage::StreamEvent(event) => convert_stream_event(event),
        RawMessage::AssistantMessage(message) => convert_assistant_message(message, attribution),
        RawMessage::UserMessage(_) => {
            tracing::debug!("user message received, not converted");
            Vec::new()
        }
        RawMessage::SystemMessage(message) => {
            tracing::debug!(subtype = ?message.subtype, "system message received, not converted");
            Vec::new()
        }
        RawMessage::ResultMessage(message) => {
            tracing::debug!(
                subtype = ?message.subtype,
                is_error = message.is_error,
                "result message received, not converted"
            );
            Vec::new()
        }
    }
}

fn convert_stream_event(event: &conclave_llm::StreamEvent) -> Vec<DomainEvent> {
    let payload = &event.event;
    let event_type = payload.get("type").and_then(|v| v.as_str()).unwrap_or("");
    let content_index = payload.get("index").and_then(serde_json::Value::as_u64).unwrap_or(0);

    match event_type {
        "message_start" => vec![DomainEvent::MessageStart],

        "content_block_delta" => {
            let delta = payload.get("delta");
            let delta_type = delta.and_then(|d| d.get("type")).and_then(|v| v.as_str());
            match delta_type {
                Some("text_delta") => {
                    let text = delta
                        .and_then(|d| d.get("text"))
                        .and_then(|v| v.as_str())
                        .unwrap_or("");
                    if text.is_empty() {
                        Vec::new()
                    } else {
                        vec![DomainEvent::StreamDelta {
                            content_index,
                            text: text.to_string(),
                        }]
                    }
                }
                // Tool input is streamed incrementally as partial JSON; we
                // wait for the complete AssistantMessage instead.
                Some("input_json_delta") => Vec::new(),
                _ => Vec::new(),
            }
        }

        // The tool-use block's input is empty at this point — it's
        // extracted from the complete AssistantMessage instead.
        "content_block_start" => Vec::new(),

        "content_block_stop" => vec![DomainEvent::ContentBlockStop { content_index }],

        "message_delta" => {
            let stop_reason = payload
                .get("delta")
                .and_then(|d| d.get("stop_reason"))
                .and_then(|v| v.as_str());
            match stop_reason {
                Some("end_turn") => vec![DomainEvent::MessageComplete],
                // "tool_use" means more turns are coming; any other value is
                // not yet a recognized completion signal.
                _ => Vec::new(),
            }
        }

        "message_stop" => Vec::new(),

        other => {
            tracing::warn!(event_type = other, "unrecognized stream event type");
            Vec::new()
        }
    }
}

fn convert_assistant_message(
    message: &AssistantMessage,
    attribution: &Attribution,
) -> Vec<DomainEvent> {
    if let Some(error) = &message.error {
        return vec![DomainEvent::Error {
            message: format!("Assistant error: {error}"),
            error_type: Some(error.clone()),
        }];
    }

    let mut events = Vec::new();
    for block in &message.content {
        match block {
            // Already streamed via content_block_delta.
            ContentBlock::Text { .. } => {}

            ContentBlock::ToolUse { id, name, input } => {
                events.push(DomainEvent::ToolUse {
                    id: id.clone(),
                    name: name.clone(),
                    input: input.clone(),
                    attribution: attribution.clone(),
                });
            }

            ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => {
                let result = content.as_ref().map(stringify_result);
                events.push(DomainEvent::ToolComplete {
                    tool_use_id: tool_use_id.clone(),
                    result,
                    is_error: *is_error,
                });
            }

            ContentBlock::Thinking { .. } => {}
        }
    }
    events
}

fn stringify_result(content: &serde_json::Value) -> String {
    match content {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conclave_llm::{ResultMessage, SystemMessage, UserMessage};
    use serde_json::json;

    fn attrib() -> Attribution {
        Attribution {
            response_id: Some("r1".to_string()),
            agent_id: Some("backend-dev".to_string()),
            agent_name: Some("Backend Dev".to_string()),
        }
    }

    #[test]
    fn message_start_stream_event_produces_message_start() {
        let raw = RawMessage::StreamEvent(conclave_llm::StreamEvent {
            session_id: None,
            event: json!({"type": "message_start"}),
        });
        assert_eq!(convert(&raw, &attrib()), vec![DomainEvent::MessageStart]);
    }

    #[test]
    fn empty_text_delta_produces_nothing() {
        let raw = RawMessage::StreamEvent(conclave_llm::StreamEvent {
            session_id: None,
            event: json!({
                "type": "content_block_delta",
                "index": 0,
                "delta": {"type": "text_delta", "text": ""},
            }),
        });
        assert!(convert(&raw, &attrib()).is_empty());
    }

    #[test]
    fn non_empty_text_delta_produces_stream_delta_with_index() {
        let raw = RawMessage::StreamEvent(conclave_llm::StreamEvent {
            session_id: None,
            event: json!({
                "type": "content_block_delta",
                "index": 2,
                "delta": {"type": "text_delta", "text": "hi"},
            }),
        });
        assert_eq!(
            convert(&raw, &attrib()),
            vec![DomainEvent::StreamDelta { content_index: 2, text: "hi".to_string() }]
        );
    }

    #[test]
    fn input_json_delta_produces_nothing() {
        let raw = RawMessage::StreamEvent(conclave_llm::StreamEvent {
            session_id: None,
            event: json!({
                "type": "content_block_delta",
                "index": 0,
                "delta": {"type": "input_json_delta", "partial_json": "{\"a\":"},
            }),
        });
        assert!(convert(&raw, &attrib()).is_empty());
    }

    #[test]
    fn content_block_stop_carries_index() {
        let raw = RawMessage::StreamEvent(conclave_llm::StreamEvent {
            session_id: None,
            event: json!({"type": "content_block_stop", "index": 1}),
        });
        assert_eq!(
            convert(&raw, &attrib()),
            vec![DomainEvent::ContentBlockStop { content_index: 1 }]
        );
    }

    #[test]
    fn message_delta_end_turn_completes() {
        let raw = RawMessage::StreamEvent(conclave_llm::StreamEvent {
            session_id: None,
            event: json!({"type": "message_delta", "delta": {"stop_reason": "end_turn"}}),
        });
        assert_eq!(convert(&raw, &attrib()), vec![DomainEvent::MessageComplete]);
    }

    #[test]
    fn message_delta_tool_use_does_not_complete() {
        let raw = RawMessage::StreamEvent(conclave_llm::StreamEvent {
            session_id: None,
            event: json!({"type": "message_delta", "delta": {"stop_reason": "tool_use"}}),
        });
        assert!(convert(&raw, &attrib()).is_empty());
    }

    #[test]
    fn assistant_message_skips_text_and_extracts_tool_use() {
        let message = AssistantMessage {
            content: vec![
                ContentBlock::Text { text: "already streamed".to_string() },
                ContentBlock::ToolUse {
                    id: "t1".to_string(),
                    name: "show_file".to_string(),
                    input: json!({"path": "a.rs"}),
                },
            ],
            error: None,
        };
        let events = convert(&RawMessage::AssistantMessage(message), &attrib());
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::ToolUse { id, name, attribution, .. } => {
                assert_eq!(id, "t1");
                assert_eq!(name, "show_file");
                assert_eq!(attribution.agent_id.as_deref(), Some("backend-dev"));
            }
            other => panic!("expected ToolUse, got {other:?}"),
        }
    }

    #[test]
    fn assistant_message_error_short_circuits_other_blocks() {
        let message = AssistantMessage {
            content: vec![ContentBlock::Text { text: "ignored".to_string() }],
            error: Some("overloaded".to_string()),
        };
        let events = convert(&RawMessage::AssistantMessage(message), &attrib());
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], DomainEvent::Error { error_type, .. } if error_type.as_deref() == Some("overloaded")));
    }

    #[test]
    fn tool_result_string_content_passes_through_unquoted() {
        let message = AssistantMessage {
            content: vec![ContentBlock::ToolResult {
                tool_use_id: "t1".to_string(),
                content: Some(json!("file contents")),
                is_error: false,
            }],
            error: None,
        };
        let events = convert(&RawMessage::AssistantMessage(message), &attrib());
        match &events[0] {
            DomainEvent::ToolComplete { result, is_error, .. } => {
                assert_eq!(result.as_deref(), Some("file contents"));
                assert!(!is_error);
            }
            other => panic!("expected ToolComplete, got {other:?}"),
        }
    }

    #[test]
    fn tool_result_structured_content_is_json_stringified() {
        let message = AssistantMessage {
            content: vec![ContentBlock::ToolResult {
                tool_use_id: "t1".to_string(),
                content: Some(json!([{"type": "text", "text": "a"}])),
                is_error: true,
            }],
            error: None,
        };
        let events = convert(&RawMessage::AssistantMessage(message), &attrib());
        match &events[0] {
            DomainEvent::ToolComplete { result, is_error, .. } => {
                assert!(result.as_ref().unwrap().contains("\"text\":\"a\""));
                assert!(is_error);
            }
            other => panic!("expected ToolComplete, got {other:?}"),
        }
    }

    #[test]
    fn user_system_result_messages_convert_to_nothing() {
        assert!(convert(
            &RawMessage::UserMessage(UserMessage { content: json!("hi") }),
            &attrib()
        )
        .is_empty());
        assert!(convert(
            &RawMessage::SystemMessage(SystemMessage { subtype: Some("init".to_string()) }),
            &attrib()
        )
        .is_empty());
        assert!(convert(
            &RawMessage::ResultMessage(ResultMessage { subtype: None, is_error: false }),
            &attrib()
        )
        .is_empty());
    }
}

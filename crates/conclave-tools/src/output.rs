//! Tool call results, shaped for the wire format every tool server in the
//! original used: `{"content": [{"type": "text", "text": "..."}], ...}`.

use serde_json::{Map, Value};

/// A successful tool call's response.
///
/// `text` becomes the sole element of the `content` array; `fields` are
/// merged onto the response object alongside it (e.g. `spawn_instance`'s
/// `session_id`/`agent_id`/`project_id`, read back by the PM's next turn).
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    text: String,
    fields: Map<String, Value>,
}

impl ToolOutput {
    /// A plain text response with no extra fields.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into(), fields: Map::new() }
    }

    /// `show_file`'s empty-content response: the UI treats the invocation
    /// itself, not any returned text, as the display directive.
    #[must_use]
    pub fn empty() -> Self {
        Self::text(String::new())
    }

    /// Attach an extra top-level field to the response object.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Render the `{content: [...], ...fields}` wire shape.
    #[must_use]
    pub fn into_json(self) -> Value {
        let mut map = self.fields;
        map.insert(
            "content".to_string(),
            Value::Array(vec![serde_json::json!({ "type": "text", "text": self.text })]),
        );
        Value::Object(map)
    }

    /// The `{content: [{type: "text", text: "✗ Error: ..."}]}` error shape,
    /// matching every original tool server's `_error()` helper.
    #[must_use]
    pub fn error(message: impl std::fmt::Display) -> Value {
        serde_json::json!({
            "content": [{ "type": "text", "text": format!("✗ Error: {message}") }]
        })
    }
}

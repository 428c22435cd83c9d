use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body posted by the chat widget.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
}

/// One-shot reply: `{"response": "..."}`.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
}

impl ChatReply {
    /// The reply text, or `fallback` when the backend sent nothing usable.
    pub fn text_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.response.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => fallback,
        }
    }
}

/// A single server-sent event frame. Any combination of fields may be set.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct StreamPayload {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl StreamPayload {
    /// Human readable error text, if the frame carries an error.
    pub fn error_summary(&self) -> Option<String> {
        let summary = match self.error.as_ref()? {
            Value::Null => return None,
            Value::String(text) => text.clone(),
            Value::Object(map) => map
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| Value::Object(map.clone()).to_string()),
            other => other.to_string(),
        };
        let collapsed = summary.split_whitespace().collect::<Vec<_>>().join(" ");
        Some(collapsed)
    }
}

//! Lenient decoding of honeypot request bodies.
//!
//! Any body shape maps to a `(session_id, text)` pair; nothing here fails.

use serde_json::{Map, Value};

/// The `message` field of an inbound body, by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageField {
    /// Field absent or `null`.
    Missing,
    /// Any non-object value, coerced to a string. Non-string scalars and
    /// arrays are rendered as JSON text (`["otp"]`), which keyword matching
    /// treats the same as any other rendering.
    Text(String),
    /// `{"text": ...}`; `text` is empty unless it was a string or number.
    Structured { text: String },
}

impl MessageField {
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Missing,
            Some(Value::Object(fields)) => Self::Structured {
                text: fields.get("text").and_then(text_scalar).unwrap_or_default(),
            },
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(other) => Self::Text(other.to_string()),
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Text(text) | Self::Structured { text } => text,
        }
    }
}

/// Canonical request after normalization: a session id and lower-cased text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub session_id: String,
    pub text: String,
}

impl InboundMessage {
    /// Normalize an already-decoded body. Non-object bodies count as `{}`.
    pub fn normalize(body: &Value, default_session_id: &str) -> Self {
        let empty = Map::new();
        let fields = body.as_object().unwrap_or(&empty);

        let session_id = ["sessionId", "session_id"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(session_scalar))
            .unwrap_or_else(|| default_session_id.to_string());

        let text = MessageField::from_value(fields.get("message"))
            .into_text()
            .to_lowercase();

        Self { session_id, text }
    }

    /// Decode raw body bytes and normalize them.
    pub fn from_bytes(bytes: &[u8], default_session_id: &str) -> Self {
        Self::normalize(&decode_body(bytes), default_session_id)
    }
}

/// Parse a body as JSON, mapping empty or malformed input to `null`.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "undecodable honeypot body, treating as empty");
        Value::Null
    })
}

fn text_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn session_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

//! Request boundary types: the inbound exchange body and the generic error body.

use serde::{Deserialize, Serialize};

/// Body of an inbound exchange request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub messages: Vec<IncomingMessage>,
    pub sandbox_id: String,
}

/// A client-submitted conversation turn, before normalization.
///
/// The role is kept as a raw string: unknown roles are coerced by the
/// normalizer instead of failing deserialization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IncomingMessage {
    pub role: String,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<UiPart>,
}

impl IncomingMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: MessageContent::Plain(content.into()),
            parts: Vec::new(),
        }
    }

    pub fn with_parts(mut self, parts: Vec<UiPart>) -> Self {
        self.parts = parts;
        self
    }
}

/// Flat string content, a list of typed parts, or any other JSON value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Plain(String),
    Parted(Vec<UiPart>),
    /// Anything else a client sent (`null`, numbers, objects). Coerced to
    /// text by the normalizer.
    Other(serde_json::Value),
}

impl Default for MessageContent {
    fn default() -> Self {
        Self::Plain(String::new())
    }
}

/// A typed message part. Only text parts contribute to the canonical content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UiPart {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

impl UiPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }
}

/// JSON body returned when an exchange cannot start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub const INTERNAL_STATUS: u16 = 500;

    pub fn internal() -> Self {
        Self {
            error: "Internal Server Error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_content_shapes() {
        let request: ExchangeRequest = serde_json::from_value(json!({
            "sandboxId": "sbx-1",
            "messages": [
                { "role": "user", "content": "open firefox" },
                {
                    "role": "assistant",
                    "content": "",
                    "parts": [
                        { "type": "step-start" },
                        { "type": "text", "text": "Opening" },
                        { "type": "tool-invocation", "toolInvocation": {} }
                    ]
                },
                { "role": "user", "content": [{ "type": "text", "text": "thanks" }] }
            ]
        }))
        .unwrap();

        assert_eq!(request.sandbox_id, "sbx-1");
        assert_eq!(request.messages[1].parts[1], UiPart::text("Opening"));
        assert_eq!(request.messages[1].parts[0], UiPart::Other);
        assert!(matches!(request.messages[2].content, MessageContent::Parted(_)));
    }

    #[test]
    fn missing_content_defaults_to_empty_string() {
        let message: IncomingMessage = serde_json::from_value(json!({ "role": "data" })).unwrap();
        assert_eq!(message.content, MessageContent::Plain(String::new()));
    }

    #[test]
    fn unexpected_content_shapes_still_parse() {
        let request: ExchangeRequest = serde_json::from_value(json!({
            "sandboxId": "sbx-1",
            "messages": [
                { "role": "user", "content": null },
                { "role": "user", "content": 42 },
                { "role": "user", "content": { "text": "hi" } }
            ]
        }))
        .unwrap();

        assert_eq!(request.messages[0].content, MessageContent::Other(json!(null)));
        assert_eq!(request.messages[1].content, MessageContent::Other(json!(42)));
        assert_eq!(
            request.messages[2].content,
            MessageContent::Other(json!({ "text": "hi" }))
        );
    }

    #[test]
    fn internal_error_body_shape() {
        assert_eq!(
            serde_json::to_value(ErrorBody::internal()).unwrap(),
            json!({ "error": "Internal Server Error" })
        );
    }
}

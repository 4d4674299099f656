//! Streaming event types shared by the decoder, the loop and the encoder.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One unit of communication between adjacent pipeline stages.
///
/// Events are produced, encoded and written in the same order; nothing
/// downstream of the decoder may reorder, merge or drop them.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental assistant text.
    TextDelta { text: String },
    /// A tool call was announced. `args` holds whatever arguments had
    /// arrived with the first fragment.
    ToolCallStart {
        id: String,
        name: String,
        args: serde_json::Value,
    },
    /// Outcome of a dispatched tool call.
    ToolCallResult(ToolResult),
    /// A model turn ended.
    Finish { reason: FinishReason },
    /// The exchange failed; always the last event of an exchange.
    Error { message: String },
}

impl StreamEvent {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text-delta",
            Self::ToolCallStart { .. } => "tool-call",
            Self::ToolCallResult(_) => "tool-result",
            Self::Finish { .. } => "finish",
            Self::Error { .. } => "error",
        }
    }
}

/// Result of a single tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub tool_call_id: String,
    pub payload: ToolPayload,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(tool_call_id: impl Into<String>, payload: ToolPayload) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            payload,
            is_error: false,
        }
    }

    pub fn error(tool_call_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.into(),
            payload: ToolPayload::text(message),
            is_error: true,
        }
    }
}

/// Content returned by a tool executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolPayload {
    Text {
        text: String,
    },
    Image {
        /// Base64-encoded image bytes.
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ToolPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Text view of the payload, used when feeding results back to the model.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::Image { .. } => None,
        }
    }
}

/// Why a model turn ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
    Other(String),
}

impl FinishReason {
    /// Parse a provider finish reason (`tool_calls`, `model_length`, ...).
    pub fn from_provider(value: &str) -> Self {
        match value {
            "stop" => Self::Stop,
            "length" | "model_length" => Self::Length,
            "tool_calls" | "tool-calls" => Self::ToolCalls,
            "content_filter" | "content-filter" => Self::ContentFilter,
            "error" => Self::Error,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire spelling.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stop => "stop",
            Self::Length => "length",
            Self::ToolCalls => "tool-calls",
            Self::ContentFilter => "content-filter",
            Self::Error => "error",
            Self::Other(value) => value,
        }
    }
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FinishReason> for String {
    fn from(reason: FinishReason) -> Self {
        reason.as_str().to_string()
    }
}

impl From<String> for FinishReason {
    fn from(value: String) -> Self {
        Self::from_provider(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_finish_reasons_map_to_wire_spelling() {
        assert_eq!(FinishReason::from_provider("tool_calls").as_str(), "tool-calls");
        assert_eq!(FinishReason::from_provider("model_length"), FinishReason::Length);
        assert_eq!(
            FinishReason::from_provider("insufficient_quota"),
            FinishReason::Other("insufficient_quota".into())
        );
    }

    #[test]
    fn image_payload_serializes_with_type_tag() {
        let payload = ToolPayload::Image {
            data: "aGk=".into(),
            mime_type: "image/png".into(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["mimeType"], "image/png");
    }
}

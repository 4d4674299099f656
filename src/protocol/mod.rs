//! Wire protocol: one `data: <json>\n\n` frame per stream event.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::PilotError;
use crate::types::{FinishReason, StreamEvent, ToolPayload};

const FRAME_PREFIX: &str = "data: ";
const FRAME_TERMINATOR: &str = "\n\n";

/// JSON body of a frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Frame {
    #[serde(rename_all = "camelCase")]
    TextDelta { text_delta: String },

    #[serde(rename_all = "camelCase")]
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: serde_json::Value,
    },

    #[serde(rename_all = "camelCase")]
    ToolResult {
        tool_call_id: String,
        result: ToolPayload,
        is_error: bool,
    },

    #[serde(rename_all = "camelCase")]
    Finish { finish_reason: FinishReason },

    Error { error: String },
}

impl From<&StreamEvent> for Frame {
    fn from(event: &StreamEvent) -> Self {
        match event {
            StreamEvent::TextDelta { text } => Self::TextDelta {
                text_delta: text.clone(),
            },
            StreamEvent::ToolCallStart { id, name, args } => Self::ToolCall {
                tool_call_id: id.clone(),
                tool_name: name.clone(),
                args: args.clone(),
            },
            StreamEvent::ToolCallResult(result) => Self::ToolResult {
                tool_call_id: result.tool_call_id.clone(),
                result: result.payload.clone(),
                is_error: result.is_error,
            },
            StreamEvent::Finish { reason } => Self::Finish {
                finish_reason: reason.clone(),
            },
            StreamEvent::Error { message } => Self::Error {
                error: message.clone(),
            },
        }
    }
}

impl Frame {
    /// Parse one encoded frame (`data: {...}` with or without the blank line).
    pub fn parse(frame: &str) -> Result<Self, PilotError> {
        let body = frame
            .trim_end()
            .strip_prefix(FRAME_PREFIX)
            .ok_or_else(|| PilotError::Stream(format!("not a data frame: {frame:?}")))?;
        Ok(serde_json::from_str(body)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextDelta { .. } => "text-delta",
            Self::ToolCall { .. } => "tool-call",
            Self::ToolResult { .. } => "tool-result",
            Self::Finish { .. } => "finish",
            Self::Error { .. } => "error",
        }
    }
}

/// Encode one event as a self-delimited frame.
pub fn encode(event: &StreamEvent) -> Result<String, PilotError> {
    let json = serde_json::to_string(&Frame::from(event))?;
    Ok(format!("{FRAME_PREFIX}{json}{FRAME_TERMINATOR}"))
}

/// Writes encoded frames to the client, one channel send per frame.
#[derive(Debug, Clone)]
pub struct FrameSink {
    tx: mpsc::Sender<String>,
}

impl FrameSink {
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }

    /// Bounded sink plus its receiving end.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Encode and send. Waits while the channel is full; fails once the
    /// receiver is gone.
    pub async fn send(&self, event: &StreamEvent) -> Result<(), PilotError> {
        let frame = encode(event)?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| PilotError::Stream("client disconnected".into()))
    }

    /// Send without waiting for channel capacity.
    pub fn try_send(&self, event: &StreamEvent) -> Result<(), PilotError> {
        let frame = encode(event)?;
        self.tx
            .try_send(frame)
            .map_err(|e| PilotError::Stream(format!("frame dropped: {e}")))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolResult;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn body(event: StreamEvent) -> serde_json::Value {
        let frame = encode(&event).unwrap();
        assert!(frame.starts_with("data: "));
        assert!(frame.ends_with("\n\n"));
        serde_json::from_str(frame.trim_start_matches("data: ").trim_end()).unwrap()
    }

    #[test]
    fn frame_shapes_match_the_wire_format() {
        assert_eq!(
            body(StreamEvent::TextDelta { text: "Hello ".into() }),
            json!({ "type": "text-delta", "textDelta": "Hello " })
        );
        assert_eq!(
            body(StreamEvent::ToolCallStart {
                id: "1".into(),
                name: "bash".into(),
                args: json!({ "command": "ls" }),
            }),
            json!({ "type": "tool-call", "toolCallId": "1", "toolName": "bash", "args": { "command": "ls" } })
        );
        assert_eq!(
            body(StreamEvent::ToolCallResult(ToolResult::error("1", "boom"))),
            json!({
                "type": "tool-result",
                "toolCallId": "1",
                "result": { "type": "text", "text": "boom" },
                "isError": true
            })
        );
        assert_eq!(
            body(StreamEvent::Finish { reason: FinishReason::ToolCalls }),
            json!({ "type": "finish", "finishReason": "tool-calls" })
        );
        assert_eq!(
            body(StreamEvent::Error { message: "reset".into() }),
            json!({ "type": "error", "error": "reset" })
        );
    }

    #[test]
    fn parse_reads_back_an_encoded_frame() {
        let frame = encode(&StreamEvent::Finish { reason: FinishReason::Stop }).unwrap();
        assert_eq!(
            Frame::parse(&frame).unwrap(),
            Frame::Finish { finish_reason: FinishReason::Stop }
        );
        assert!(Frame::parse("event: ping").is_err());
    }

    #[tokio::test]
    async fn closed_receiver_is_an_error() {
        let (sink, rx) = FrameSink::channel(1);
        drop(rx);
        let err = sink
            .send(&StreamEvent::TextDelta { text: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, PilotError::Stream(_)));
        assert!(sink.is_closed());
    }
}

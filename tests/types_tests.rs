//! Tests for core types and their wire shapes.

use pretty_assertions::assert_eq;
use serde_json::json;

use desktop_pilot::protocol::{encode, Frame};
use desktop_pilot::types::*;

#[test]
fn conversation_message_constructors() {
    let msg = ConversationMessage::system("You are helpful.");
    assert_eq!(msg.role, Role::System);
    assert_eq!(msg.content, "You are helpful.");

    let msg = ConversationMessage::tool_result("call_1", "Screenshot captured.");
    assert_eq!(msg.role, Role::Tool);
    assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
}

#[test]
fn conversation_message_serde_skips_empty_fields() {
    let json = serde_json::to_value(ConversationMessage::user("test")).unwrap();
    assert_eq!(json, json!({ "role": "user", "content": "test" }));
}

#[test]
fn exchange_request_accepts_client_body() {
    let body = json!({
        "sandboxId": "sbx-1",
        "messages": [
            { "role": "user", "content": "open firefox" },
            { "role": "assistant", "content": [{ "type": "text", "text": "Opening" }, { "type": "reasoning" }] },
            { "role": "system" }
        ]
    });
    let request: ExchangeRequest = serde_json::from_value(body).unwrap();

    assert_eq!(request.sandbox_id, "sbx-1");
    assert_eq!(request.messages.len(), 3);
    assert_eq!(
        request.messages[1].content,
        MessageContent::Parted(vec![UiPart::text("Opening"), UiPart::Other])
    );
    assert_eq!(request.messages[2].content, MessageContent::default());
}

#[test]
fn text_delta_frame_shape() {
    let frame = encode(&StreamEvent::TextDelta { text: "Hi".into() }).unwrap();
    assert_eq!(frame, "data: {\"type\":\"text-delta\",\"textDelta\":\"Hi\"}\n\n");
}

#[test]
fn tool_result_frame_shape() {
    let event = StreamEvent::ToolCallResult(ToolResult::error("call_1", "Tool 'zoom' not found"));
    let frame = Frame::parse(&encode(&event).unwrap()).unwrap();
    assert_eq!(
        serde_json::to_value(&frame).unwrap(),
        json!({
            "type": "tool-result",
            "toolCallId": "call_1",
            "result": { "type": "text", "text": "Tool 'zoom' not found" },
            "isError": true
        })
    );
}

#[test]
fn finish_frame_uses_wire_spelling() {
    let frame = encode(&StreamEvent::Finish {
        reason: FinishReason::from_provider("tool_calls"),
    })
    .unwrap();
    assert!(frame.contains("\"finishReason\":\"tool-calls\""), "{frame}");
    assert_eq!(Frame::parse(&frame).unwrap().kind(), "finish");
}

#[test]
fn generation_settings_default_is_empty() {
    let settings = GenerationSettings::default();
    assert_eq!(settings.temperature, None);
    assert_eq!(settings.max_tokens, None);
}

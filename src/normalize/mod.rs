//! Message normalizer: client-submitted turns to canonical conversation messages.

use crate::types::{ConversationMessage, IncomingMessage, MessageContent, Role, UiPart};

/// Normalize an inbound history. Produces exactly one message per input and
/// never fails.
pub fn normalize_messages(incoming: &[IncomingMessage]) -> Vec<ConversationMessage> {
    incoming.iter().map(normalize_message).collect()
}

/// Normalize a single inbound message.
pub fn normalize_message(message: &IncomingMessage) -> ConversationMessage {
    match message.role.as_str() {
        "user" => ConversationMessage::user(content_text(&message.content)),
        "assistant" => ConversationMessage::assistant(assistant_text(message)),
        other => {
            tracing::debug!(role = other, "coercing message role to user");
            ConversationMessage::user(content_text(&message.content))
        }
    }
}

fn assistant_text(message: &IncomingMessage) -> String {
    let parts = match &message.content {
        MessageContent::Parted(parts) if message.parts.is_empty() => parts.as_slice(),
        _ => message.parts.as_slice(),
    };
    let text = concat_text_parts(parts);
    if text.is_empty() {
        content_text(&message.content)
    } else {
        text
    }
}

fn content_text(content: &MessageContent) -> String {
    match content {
        MessageContent::Plain(text) => text.clone(),
        MessageContent::Parted(parts) => concat_text_parts(parts),
        MessageContent::Other(serde_json::Value::Null) => String::new(),
        MessageContent::Other(value) => value.to_string(),
    }
}

fn concat_text_parts(parts: &[UiPart]) -> String {
    parts
        .iter()
        .filter_map(|part| match part {
            UiPart::Text { text } => Some(text.as_str()),
            UiPart::Other => None,
        })
        .collect()
}

/// Build the full prompt for the first model turn.
pub fn with_system_prompt(
    system_prompt: Option<&str>,
    history: Vec<ConversationMessage>,
) -> Vec<ConversationMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    if let Some(prompt) = system_prompt.filter(|p| !p.is_empty()) {
        messages.push(ConversationMessage::system(prompt));
    }
    messages.extend(history);
    messages
}

//! Mistral Chat Completions API provider (streaming only).

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tracing::debug;

use crate::error::PilotError;
use crate::types::{ConversationMessage, Role, ToolChoice};

use super::http::{
    bearer_headers, parse_sse_line, shared_client, status_to_error, LineBuffer, SseLine,
};
use super::{ChunkStream, ModelChunk, ModelProvider, ModelRequest, ToolCallFragment};

const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";

pub struct MistralProvider {
    model: String,
    api_key: String,
    base_url: String,
}

impl MistralProvider {
    pub fn new(model: impl Into<String>, api_key: String, base_url: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    fn build_request_body(&self, request: &ModelRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_mistral)
            .collect::<Vec<_>>();

        let mut obj = serde_json::Map::new();
        obj.insert("model".into(), self.model.clone().into());
        obj.insert("messages".into(), messages.into());
        obj.insert("stream".into(), true.into());

        let settings = &request.settings;
        if let Some(max) = settings.max_tokens {
            obj.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = settings.temperature {
            obj.insert("temperature".into(), temp.into());
        }
        if let Some(top_p) = settings.top_p {
            obj.insert("top_p".into(), top_p.into());
        }
        if let Some(seed) = settings.random_seed {
            obj.insert("random_seed".into(), seed.into());
        }

        if !request.tools.is_empty() {
            let tool_defs: Vec<serde_json::Value> = request
                .tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        }
                    })
                })
                .collect();
            obj.insert("tools".into(), tool_defs.into());
            obj.insert(
                "tool_choice".into(),
                tool_choice_str(settings.tool_choice).into(),
            );
        }

        serde_json::Value::Object(obj)
    }
}

#[async_trait]
impl ModelProvider for MistralProvider {
    fn provider_name(&self) -> &str {
        "mistral"
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn stream_chat(&self, request: &ModelRequest) -> Result<ChunkStream, PilotError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Mistral stream_chat"
        );

        let resp = shared_client()
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        let byte_stream = resp.bytes_stream();

        let stream = async_stream::stream! {
            let mut buffer = LineBuffer::new();
            futures::pin_mut!(byte_stream);

            'read: while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(e) => {
                        yield Err(PilotError::Network(e));
                        break;
                    }
                };

                buffer.push(&chunk);

                while let Some(line) = buffer.next_line() {
                    match parse_sse_line(&line) {
                        SseLine::Done => break 'read,
                        SseLine::Ignored => continue,
                        SseLine::Data(data) => match parse_chunk(data) {
                            Ok(Some(chunk)) => yield Ok(chunk),
                            Ok(None) => {}
                            Err(e) => {
                                yield Err(e);
                                break 'read;
                            }
                        },
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

fn tool_choice_str(choice: ToolChoice) -> &'static str {
    match choice {
        ToolChoice::Auto => "auto",
        ToolChoice::Any => "any",
        ToolChoice::None => "none",
    }
}

/// Parse one SSE payload. `Ok(None)` for payloads that carry nothing usable.
fn parse_chunk(data: &str) -> Result<Option<ModelChunk>, PilotError> {
    let chunk = match serde_json::from_str::<MistralStreamChunk>(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            debug!(error = %e, "skipping unparseable Mistral chunk");
            return Ok(None);
        }
    };

    if chunk.object.as_deref() == Some("error") || chunk.choices.is_empty() {
        if let Some(message) = chunk.message {
            return Err(PilotError::Stream(message));
        }
        return Ok(None);
    }

    let Some(choice) = chunk.choices.into_iter().next() else {
        return Ok(None);
    };
    let content = choice.delta.content.and_then(content_text);
    let tool_calls = choice
        .delta
        .tool_calls
        .unwrap_or_default()
        .into_iter()
        .map(|tc| ToolCallFragment {
            index: tc.index,
            id: tc.id.filter(|id| !id.is_empty() && id != "null"),
            name: tc.function.as_ref().and_then(|f| f.name.clone()),
            arguments: tc.function.and_then(|f| f.arguments).map(arguments_text),
        })
        .collect();

    Ok(Some(ModelChunk {
        content,
        tool_calls,
        finish_reason: choice.finish_reason,
    }))
}

/// Mistral sends content as a string, or as typed chunks on some models.
fn content_text(content: serde_json::Value) -> Option<String> {
    match content {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Array(parts) => {
            let text: String = parts
                .iter()
                .filter(|p| p.get("type").and_then(|t| t.as_str()) == Some("text"))
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect();
            (!text.is_empty()).then_some(text)
        }
        _ => None,
    }
}

fn arguments_text(arguments: serde_json::Value) -> String {
    match arguments {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn message_to_mistral(msg: &ConversationMessage) -> serde_json::Value {
    match msg.role {
        Role::Tool => serde_json::json!({
            "role": "tool",
            "tool_call_id": msg.tool_call_id,
            "content": msg.content,
        }),
        Role::Assistant if !msg.tool_calls.is_empty() => {
            let tc_json: Vec<serde_json::Value> = msg
                .tool_calls
                .iter()
                .map(|tc| {
                    serde_json::json!({
                        "id": tc.id,
                        "type": "function",
                        "function": {
                            "name": tc.name,
                            "arguments": arguments_text(tc.arguments.clone()),
                        }
                    })
                })
                .collect();
            serde_json::json!({
                "role": "assistant",
                "content": msg.content,
                "tool_calls": tc_json,
            })
        }
        role if !msg.images.is_empty() => {
            let mut parts = Vec::with_capacity(msg.images.len() + 1);
            if !msg.content.is_empty() {
                parts.push(serde_json::json!({ "type": "text", "text": msg.content }));
            }
            for img in &msg.images {
                parts.push(serde_json::json!({
                    "type": "image_url",
                    "image_url": format!("data:{};base64,{}", img.mime_type, img.data),
                }));
            }
            serde_json::json!({ "role": role.to_string(), "content": parts })
        }
        role => serde_json::json!({ "role": role.to_string(), "content": msg.content }),
    }
}

// Mistral API stream types (internal)

#[derive(Deserialize)]
struct MistralStreamChunk {
    #[serde(default)]
    object: Option<String>,
    #[serde(default)]
    choices: Vec<MistralStreamChoice>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct MistralStreamChoice {
    #[serde(default)]
    delta: MistralStreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct MistralStreamDelta {
    content: Option<serde_json::Value>,
    tool_calls: Option<Vec<MistralToolCallDelta>>,
}

#[derive(Deserialize)]
struct MistralToolCallDelta {
    id: Option<String>,
    index: Option<u32>,
    function: Option<MistralFunctionDelta>,
}

#[derive(Deserialize)]
struct MistralFunctionDelta {
    name: Option<String>,
    arguments: Option<serde_json::Value>,
}

//! Model provider trait and implementations.

pub mod http;

#[cfg(feature = "mistral")]
pub mod mistral;

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::config::PilotConfig;
use crate::error::PilotError;
use crate::tools::ToolDefinition;
use crate::types::{ConversationMessage, GenerationSettings};

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<ToolDefinition>,
    pub settings: GenerationSettings,
}

/// One incremental piece of a streamed model response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelChunk {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCallFragment>,
    /// Raw provider finish value (`stop`, `tool_calls`, ...).
    pub finish_reason: Option<String>,
}

impl ModelChunk {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn tool_call(fragment: ToolCallFragment) -> Self {
        Self {
            tool_calls: vec![fragment],
            ..Self::default()
        }
    }

    pub fn finish(reason: impl Into<String>) -> Self {
        Self {
            finish_reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

/// A piece of one tool call. Continuation fragments may carry only the index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolCallFragment {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: Option<String>,
}

impl ToolCallFragment {
    /// First fragment of a call.
    pub fn start(
        index: u32,
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            index: Some(index),
            id: Some(id.into()),
            name: Some(name.into()),
            arguments: Some(arguments.into()),
        }
    }

    /// Continuation fragment addressed by stream index.
    pub fn args(index: u32, arguments: impl Into<String>) -> Self {
        Self {
            index: Some(index),
            arguments: Some(arguments.into()),
            ..Self::default()
        }
    }
}

pub type ChunkStream = BoxStream<'static, Result<ModelChunk, PilotError>>;

/// Core trait implemented by all model providers.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "mistral").
    fn provider_name(&self) -> &str;
    /// The model ID this provider instance serves.
    fn model_id(&self) -> &str;

    /// Open a streamed chat turn. Errors here mean no stream was opened;
    /// errors inside the stream are transport failures mid-turn.
    async fn stream_chat(&self, request: &ModelRequest) -> Result<ChunkStream, PilotError>;
}

/// Create the configured provider.
#[allow(unused_variables)]
pub fn create_provider(config: &PilotConfig) -> Result<Arc<dyn ModelProvider>, PilotError> {
    #[cfg(feature = "mistral")]
    {
        let api_key = config.require_api_key()?;
        Ok(Arc::new(mistral::MistralProvider::new(
            config.model.clone(),
            api_key.to_string(),
            Some(config.base_url.clone()),
        )))
    }
    #[cfg(not(feature = "mistral"))]
    {
        Err(PilotError::Configuration(
            "no model provider compiled in; enable the `mistral` feature".into(),
        ))
    }
}

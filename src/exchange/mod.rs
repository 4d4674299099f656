//! Exchange orchestration: one inbound request, one streamed response.
//!
//! [`Orchestrator::start`] normalizes the conversation, binds the tools to
//! the caller's desktop session and opens the first model turn before any
//! frame exists. Failure at that point terminates the session and surfaces
//! as a [`StartError`] (HTTP 500). After that, every failure is reported in
//! band as a final `error` frame.

pub mod cleanup;
mod runner;
pub mod state;

pub use cleanup::CleanupHandler;
pub use state::{ExchangeOutcome, ExchangeState};

use std::sync::Arc;

use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use crate::config::PilotConfig;
use crate::desktop::DesktopSession;
use crate::error::PilotError;
use crate::normalize::{normalize_messages, with_system_prompt};
use crate::protocol::FrameSink;
use crate::provider::{self, ChunkStream, ModelProvider, ModelRequest};
use crate::tools::{ToolDispatcher, ToolRegistry};
use crate::types::{ErrorBody, ExchangeRequest};

use runner::ExchangeRunner;

/// The exchange never produced a frame.
#[derive(Debug, thiserror::Error)]
#[error("exchange failed to start: {source}")]
pub struct StartError {
    #[source]
    pub source: PilotError,
}

impl StartError {
    /// HTTP status for the response.
    pub fn status(&self) -> u16 {
        ErrorBody::INTERNAL_STATUS
    }

    /// Generic JSON body; the cause is only logged.
    pub fn body(&self) -> ErrorBody {
        ErrorBody::internal()
    }
}

/// Runs exchanges against one model provider with a shared configuration.
#[derive(Clone)]
pub struct Orchestrator {
    config: PilotConfig,
    provider: Arc<dyn ModelProvider>,
    registry: ToolRegistry,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("provider", &self.provider.provider_name())
            .field("registry", &self.registry)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(config: PilotConfig, provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            config,
            provider,
            registry: ToolRegistry::standard(),
        }
    }

    /// Build the configured provider from `config`.
    pub fn from_config(config: PilotConfig) -> Result<Self, PilotError> {
        let config = config.validate()?;
        let provider = provider::create_provider(&config)?;
        Ok(Self::new(config, provider))
    }

    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &PilotConfig {
        &self.config
    }

    /// Start an exchange on its own task.
    pub async fn start(
        &self,
        request: ExchangeRequest,
        session: Arc<dyn DesktopSession>,
    ) -> Result<ExchangeHandle, StartError> {
        let (sink, rx) = FrameSink::channel(self.config.frame_capacity);
        let cancel = CancellationToken::new();
        let (runner, first_turn) = self.prepare(request, session, sink, cancel.clone()).await?;
        let task = tokio::spawn(runner.run(first_turn));

        Ok(ExchangeHandle {
            frames: ReceiverStream::new(rx),
            control: ExchangeControl { cancel, task },
        })
    }

    /// Run an exchange to completion on the current task, writing frames to
    /// `sink`.
    pub async fn run(
        &self,
        request: ExchangeRequest,
        session: Arc<dyn DesktopSession>,
        sink: FrameSink,
        cancel: CancellationToken,
    ) -> Result<ExchangeOutcome, StartError> {
        let (runner, first_turn) = self.prepare(request, session, sink, cancel).await?;
        Ok(runner.run(first_turn).await)
    }

    async fn prepare(
        &self,
        request: ExchangeRequest,
        session: Arc<dyn DesktopSession>,
        sink: FrameSink,
        cancel: CancellationToken,
    ) -> Result<(ExchangeRunner, ChunkStream), StartError> {
        let cleanup = CleanupHandler::new(self.config.cleanup_timeout());
        if request.sandbox_id != session.sandbox_id() {
            tracing::warn!(
                requested = %request.sandbox_id,
                session = %session.sandbox_id(),
                "request sandbox id does not match the session"
            );
        }

        let history = normalize_messages(&request.messages);
        let messages = with_system_prompt(self.config.system_prompt.as_deref(), history);
        let model_request = ModelRequest {
            messages,
            tools: self.registry.definitions(),
            settings: self.config.generation.clone(),
        };
        tracing::debug!(
            sandbox_id = %session.sandbox_id(),
            provider = self.provider.provider_name(),
            model = self.provider.model_id(),
            messages = model_request.messages.len(),
            "exchange start"
        );

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PilotError::Canceled),
            opened = self.provider.stream_chat(&model_request) => opened,
        };
        let first_turn = match opened {
            Ok(stream) => stream,
            Err(source) => {
                tracing::error!(error = %source, "could not open model stream");
                cleanup.terminate(session.as_ref()).await;
                return Err(StartError { source });
            }
        };

        let dispatcher = ToolDispatcher::new(
            self.registry.bind(Arc::clone(&session)),
            self.config.tool_timeout(),
        );
        let runner = ExchangeRunner {
            provider: Arc::clone(&self.provider),
            session,
            dispatcher,
            sink,
            cleanup,
            cancel,
            request: model_request,
            max_turns: self.config.max_turns,
            state: ExchangeState::Streaming,
        };
        Ok((runner, first_turn))
    }
}

/// A running exchange: its outbound frames plus control over the task.
#[derive(Debug)]
pub struct ExchangeHandle {
    frames: ReceiverStream<String>,
    control: ExchangeControl,
}

impl ExchangeHandle {
    pub fn cancel(&self) {
        self.control.cancel();
    }

    /// Separate the frame stream (for the response body) from the control half.
    pub fn split(self) -> (ReceiverStream<String>, ExchangeControl) {
        (self.frames, self.control)
    }

    /// Drain every frame, then wait for the outcome.
    pub async fn collect(self) -> (Vec<String>, ExchangeOutcome) {
        let (frames, control) = self.split();
        let frames: Vec<String> = frames.collect().await;
        (frames, control.wait().await)
    }
}

#[derive(Debug)]
pub struct ExchangeControl {
    cancel: CancellationToken,
    task: JoinHandle<ExchangeOutcome>,
}

impl ExchangeControl {
    /// Abort at the next suspension point. The session is cleaned up.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn wait(self) -> ExchangeOutcome {
        self.task
            .await
            .unwrap_or_else(|e| ExchangeOutcome::failed(format!("exchange task ended abnormally: {e}")))
    }
}

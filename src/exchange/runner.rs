//! The orchestration loop for one exchange.
//!
//! Decode, dispatch and encode run strictly in sequence on one task. The
//! loop suspends only on the next model event, a tool execution, a frame
//! send, or cancellation.

use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use super::cleanup::CleanupHandler;
use super::state::{ExchangeOutcome, ExchangeState};
use crate::decoder::{decode_stream, DecodedEvent};
use crate::desktop::DesktopSession;
use crate::error::PilotError;
use crate::protocol::FrameSink;
use crate::provider::{ChunkStream, ModelProvider, ModelRequest};
use crate::tools::call::display_arguments;
use crate::tools::{ToolCall, ToolCallTracker, ToolDispatcher};
use crate::types::{
    ConversationMessage, FinishReason, ImageContent, StreamEvent, ToolCallRecord, ToolPayload,
    ToolResult,
};

/// Why the loop left the happy path.
#[derive(Debug)]
enum Failure {
    /// The `Error` frame has already been written.
    Reported(String),
    Unreported(PilotError),
}

impl From<PilotError> for Failure {
    fn from(err: PilotError) -> Self {
        Self::Unreported(err)
    }
}

/// What one model turn produced.
struct TurnSummary {
    text: String,
    calls: Vec<ToolCallRecord>,
    results: Vec<ToolResult>,
    finish_reason: FinishReason,
}

pub(crate) struct ExchangeRunner {
    pub(crate) provider: Arc<dyn ModelProvider>,
    pub(crate) session: Arc<dyn DesktopSession>,
    pub(crate) dispatcher: ToolDispatcher,
    pub(crate) sink: FrameSink,
    pub(crate) cleanup: CleanupHandler,
    pub(crate) cancel: CancellationToken,
    pub(crate) request: ModelRequest,
    pub(crate) max_turns: u32,
    pub(crate) state: ExchangeState,
}

impl ExchangeRunner {
    /// Drive the exchange to a terminal state, starting from an already
    /// opened first turn.
    pub(crate) async fn run(mut self, first_turn: ChunkStream) -> ExchangeOutcome {
        let sandbox_id = self.session.sandbox_id().to_string();
        match self.drive(first_turn).await {
            Ok(outcome) => {
                self.transition(ExchangeState::Finished);
                tracing::debug!(%sandbox_id, ?outcome, "exchange finished");
                outcome
            }
            Err(failure) => self.fail(failure).await,
        }
    }

    async fn drive(&mut self, first_turn: ChunkStream) -> Result<ExchangeOutcome, Failure> {
        let mut pending = Some(first_turn);
        let mut turn = 0;

        loop {
            turn += 1;
            let chunks = match pending.take() {
                Some(chunks) => chunks,
                None => self.open_turn().await?,
            };
            tracing::debug!(turn, messages = self.request.messages.len(), "model turn");

            let summary = self.stream_turn(chunks).await?;
            if summary.results.is_empty() {
                return Ok(ExchangeOutcome::Finished {
                    turns: turn,
                    finish_reason: summary.finish_reason,
                });
            }

            if turn >= self.max_turns {
                tracing::debug!(turn, max_turns = self.max_turns, "turn limit reached");
                return Ok(ExchangeOutcome::Finished {
                    turns: turn,
                    finish_reason: summary.finish_reason,
                });
            }
            self.record_turn(summary);
        }
    }

    async fn open_turn(&self) -> Result<ChunkStream, Failure> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Failure::Unreported(PilotError::Canceled)),
            opened = self.provider.stream_chat(&self.request) => Ok(opened?),
        }
    }

    async fn stream_turn(&mut self, chunks: ChunkStream) -> Result<TurnSummary, Failure> {
        self.transition(ExchangeState::Streaming);
        let mut events = decode_stream(chunks);
        let mut tracker = ToolCallTracker::new();
        let mut text = String::new();
        let mut results = Vec::new();
        let mut finish_reason = FinishReason::Stop;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Failure::Unreported(PilotError::Canceled)),
                next = events.next() => next,
            };
            let Some(event) = next else { break };

            match event {
                DecodedEvent::TextDelta { text: delta } => {
                    text.push_str(&delta);
                    self.emit(StreamEvent::TextDelta { text: delta }).await?;
                }
                DecodedEvent::ToolCallStart {
                    id,
                    name,
                    args_text,
                } => {
                    let completed = tracker.start(ToolCall::new(&id, &name, &args_text));
                    self.dispatch_all(completed, &mut results).await?;
                    self.emit(StreamEvent::ToolCallStart {
                        id,
                        name,
                        args: display_arguments(&args_text),
                    })
                    .await?;
                }
                DecodedEvent::ToolCallArgs { id, fragment } => tracker.append(&id, &fragment),
                DecodedEvent::Finish { reason } => {
                    self.emit(StreamEvent::Finish {
                        reason: reason.clone(),
                    })
                    .await?;
                    let remaining = tracker.finish();
                    self.dispatch_all(remaining, &mut results).await?;
                    finish_reason = reason;
                    break;
                }
                DecodedEvent::Error { message } => {
                    tracing::error!(error = %message, "model stream failed");
                    if let Err(e) = self.emit(StreamEvent::Error { message: message.clone() }).await {
                        tracing::debug!(error = ?e, "error frame not delivered");
                    }
                    return Err(Failure::Reported(message));
                }
            }
        }

        Ok(TurnSummary {
            text,
            calls: tracker.completed().to_vec(),
            results,
            finish_reason,
        })
    }

    async fn dispatch_all(
        &mut self,
        calls: Vec<ToolCall>,
        results: &mut Vec<ToolResult>,
    ) -> Result<(), Failure> {
        for mut call in calls {
            self.transition(ExchangeState::Dispatching);
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Failure::Unreported(PilotError::Canceled)),
                result = self.dispatcher.dispatch(&mut call) => result,
            };
            tracing::debug!(
                tool_call_id = %result.tool_call_id,
                tool = %call.name,
                is_error = result.is_error,
                "tool result"
            );
            self.emit(StreamEvent::ToolCallResult(result.clone())).await?;
            results.push(result);
            self.transition(ExchangeState::Streaming);
        }
        Ok(())
    }

    /// Append the turn to the conversation for the follow-up request.
    /// Screenshots travel as a user message after the tool messages, since
    /// tool messages carry text only.
    fn record_turn(&mut self, summary: TurnSummary) {
        let messages = &mut self.request.messages;
        messages.push(ConversationMessage::assistant_with_tool_calls(
            summary.text,
            summary.calls,
        ));

        let mut screenshots = Vec::new();
        for result in summary.results {
            let content = match result.payload {
                ToolPayload::Text { text } => text,
                ToolPayload::Image { data, mime_type } => {
                    screenshots.push(ImageContent { data, mime_type });
                    "Screenshot captured.".to_string()
                }
            };
            messages.push(ConversationMessage::tool_result(result.tool_call_id, content));
        }
        for image in screenshots {
            messages.push(ConversationMessage::user_with_image(
                "Screenshot of the current screen.",
                image,
            ));
        }
    }

    async fn emit(&self, event: StreamEvent) -> Result<(), Failure> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Failure::Unreported(PilotError::Canceled)),
            sent = self.sink.send(&event) => Ok(sent?),
        }
    }

    async fn fail(&mut self, failure: Failure) -> ExchangeOutcome {
        self.transition(ExchangeState::Failed);
        let message = match failure {
            Failure::Reported(message) => message,
            Failure::Unreported(err) => {
                let message = err.to_string();
                tracing::error!(error = %message, category = ?err.category(), "exchange failed");
                self.report(&message).await;
                message
            }
        };
        self.cleanup.terminate(self.session.as_ref()).await;
        ExchangeOutcome::failed(message)
    }

    /// Best-effort final `Error` frame. Skipped when nobody can read it.
    async fn report(&self, message: &str) {
        if self.sink.is_closed() {
            return;
        }
        let event = StreamEvent::Error {
            message: message.to_string(),
        };
        let delivered = if self.cancel.is_cancelled() {
            self.sink.try_send(&event)
        } else {
            self.sink.send(&event).await
        };
        if let Err(e) = delivered {
            tracing::debug!(error = %e, "error frame not delivered");
        }
    }

    fn transition(&mut self, next: ExchangeState) {
        if self.state != next {
            tracing::trace!(from = ?self.state, to = ?next, "exchange state");
            self.state = next;
        }
    }
}

//! Convenience re-exports for common use.

pub use crate::config::PilotConfig;
pub use crate::desktop::{ActionOutput, DesktopAction, DesktopSession};
pub use crate::error::{PilotError, Result};
pub use crate::exchange::{ExchangeHandle, ExchangeOutcome, Orchestrator, StartError};
pub use crate::protocol::{Frame, FrameSink};
pub use crate::provider::{ModelChunk, ModelProvider, ModelRequest, ToolCallFragment};
pub use crate::tools::{Tool, ToolArguments, ToolRegistry};
pub use crate::types::{
    ConversationMessage, ErrorBody, ExchangeRequest, FinishReason, GenerationSettings,
    IncomingMessage, Role, StreamEvent, ToolPayload, ToolResult,
};

//! Turns finalized tool calls into tool results.
//!
//! Nothing that goes wrong with a single call escapes this module: unknown
//! tools, malformed or invalid arguments, executor failures and timeouts all
//! become error-flagged results so the exchange can carry on.

use std::time::Duration;

use super::arguments::ToolArguments;
use super::call::{ToolCall, ToolCallState};
use super::registry::BoundTools;
use super::tool::ToolExecutionContext;
use super::validation::validate_arguments;
use crate::error::PilotError;
use crate::types::ToolResult;
use crate::util::with_timeout;

pub struct ToolDispatcher {
    tools: BoundTools,
    timeout: Duration,
}

impl ToolDispatcher {
    pub fn new(tools: BoundTools, timeout: Duration) -> Self {
        Self { tools, timeout }
    }

    /// Execute one call. Finalizes it first if the caller has not.
    pub async fn dispatch(&self, call: &mut ToolCall) -> ToolResult {
        let state = call.finalize().clone();
        let Some(tool) = self.tools.get(&call.name) else {
            tracing::warn!(tool_call_id = %call.id, tool = %call.name, "unknown tool");
            return ToolResult::error(&call.id, format!("Tool '{}' not found", call.name));
        };

        let arguments = match state {
            ToolCallState::Ready(value) => value,
            ToolCallState::Invalid(reason) => {
                tracing::warn!(tool_call_id = %call.id, tool = %call.name, %reason, "unparseable tool arguments");
                return ToolResult::error(&call.id, format!("Error: {reason}"));
            }
            ToolCallState::Accumulating => {
                return ToolResult::error(&call.id, "Error: tool call was never completed");
            }
        };

        if let Err(reason) = validate_arguments(&arguments, &tool.definition.parameters) {
            tracing::warn!(tool_call_id = %call.id, tool = %call.name, %reason, "tool arguments rejected");
            return ToolResult::error(
                &call.id,
                format!("Invalid arguments for tool '{}': {reason}", call.name),
            );
        }

        let args = ToolArguments::new(arguments);
        let ctx = ToolExecutionContext {
            tool_call_id: call.id.clone(),
            sandbox_id: self.tools.sandbox_id().to_string(),
        };
        tracing::debug!(tool_call_id = %call.id, tool = %call.name, "executing tool");

        match with_timeout(self.timeout, tool.executor.execute(&args, &ctx)).await {
            Ok(payload) => ToolResult::success(&call.id, payload),
            Err(e) => {
                tracing::warn!(tool_call_id = %call.id, tool = %call.name, error = %e, "tool failed");
                ToolResult::error(&call.id, failure_text(&call.name, &e))
            }
        }
    }
}

/// Model-facing text for an executor failure.
fn failure_text(tool_name: &str, error: &PilotError) -> String {
    match error {
        PilotError::ToolExecution { message, .. } => message.clone(),
        PilotError::InvalidArgument(message) => format!("Error: {message}"),
        PilotError::Timeout(ms) => format!("Error: tool '{tool_name}' timed out after {ms}ms"),
        other => format!("Error: {other}"),
    }
}

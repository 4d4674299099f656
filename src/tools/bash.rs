//! The `bash` tool: run a shell command on the desktop session.

use std::sync::Arc;

use async_trait::async_trait;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolParameters;
use crate::desktop::{ActionOutput, DesktopAction, DesktopSession};
use crate::error::PilotError;
use crate::types::ToolPayload;

pub const BASH_TOOL_NAME: &str = "bash";

/// Returned when a command succeeds without writing to stdout.
pub const NO_OUTPUT_SENTINEL: &str = "(Command executed successfully with no output)";

pub const BASH_DESCRIPTION: &str = "Execute bash commands in the desktop environment. \
Use this to run terminal commands, create files, install software, etc.";

pub fn bash_parameters() -> ToolParameters {
    ToolParameters::object()
        .string("command", "The bash command to execute", true)
        .build()
}

/// Executor for the `bash` tool.
///
/// Shell failures are expected; they come back as an error whose message is
/// meant for the model (`Error executing command: ...`), which the dispatcher
/// turns into an error-flagged text result.
pub struct BashTool {
    session: Arc<dyn DesktopSession>,
    parameters: ToolParameters,
}

impl BashTool {
    pub fn new(session: Arc<dyn DesktopSession>) -> Self {
        Self {
            session,
            parameters: bash_parameters(),
        }
    }

    pub async fn run(&self, command: &str) -> Result<ToolPayload, PilotError> {
        tracing::debug!(sandbox_id = self.session.sandbox_id(), command, "bash command");
        let output = self
            .session
            .perform(DesktopAction::RunCommand(command.to_string()))
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "bash command failed");
                PilotError::tool(BASH_TOOL_NAME, format!("Error executing command: {e}"))
            })?;

        let stdout = match output {
            ActionOutput::Command(out) => out.stdout,
            ActionOutput::Done | ActionOutput::Image(_) => String::new(),
        };
        if stdout.is_empty() {
            Ok(ToolPayload::text(NO_OUTPUT_SENTINEL))
        } else {
            Ok(ToolPayload::text(stdout))
        }
    }
}

#[async_trait]
impl Tool for BashTool {
    fn name(&self) -> &str {
        BASH_TOOL_NAME
    }

    fn description(&self) -> &str {
        BASH_DESCRIPTION
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<ToolPayload, PilotError> {
        let command = args.get_str("command")?;
        self.run(command).await
    }
}

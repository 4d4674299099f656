//! The `computer` tool: pointer, keyboard and screen actions on the desktop.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext};
use super::types::ToolParameters;
use crate::desktop::{
    ActionOutput, DesktopAction, DesktopSession, Point, ScrollDirection, SCREEN_RESOLUTION,
};
use crate::error::PilotError;
use crate::types::ToolPayload;

pub const COMPUTER_TOOL_NAME: &str = "computer";

/// Upper bound for the `wait` action, whatever the model asks for.
pub const MAX_WAIT_SECS: f64 = 2.0;

/// Model-facing description, including the screen size coordinates refer to.
pub fn computer_description() -> String {
    format!(
        "Use a computer to interact with the desktop environment. \
Can take screenshots, click, type, scroll, and perform other actions. \
The screen resolution is {SCREEN_RESOLUTION}."
    )
}

const ACTIONS: &[&str] = &[
    "screenshot",
    "wait",
    "left_click",
    "double_click",
    "right_click",
    "mouse_move",
    "type",
    "key",
    "scroll",
    "left_click_drag",
];

/// Parameter schema for the `computer` tool.
pub fn computer_parameters() -> ToolParameters {
    ToolParameters::object()
        .string_enum("action", "The action to perform", ACTIONS, true)
        .coordinate("coordinate", "The [x, y] coordinate for click/move actions", false)
        .string("text", "Text to type or key to press", false)
        .number("duration", "Duration in seconds for wait action", false)
        .number("scroll_amount", "Amount to scroll", false)
        .string_enum("scroll_direction", "Direction to scroll", &["up", "down"], false)
        .coordinate("start_coordinate", "Start coordinate for drag actions", false)
        .build()
}

/// A fully parsed computer action. Parsing happens before any side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum ComputerAction {
    Screenshot,
    /// Already clamped to [`MAX_WAIT_SECS`].
    Wait { seconds: f64 },
    LeftClick(Point),
    DoubleClick(Point),
    RightClick(Point),
    MouseMove(Point),
    Type(String),
    Key(String),
    Scroll {
        direction: ScrollDirection,
        amount: u32,
    },
    LeftClickDrag {
        start: Point,
        end: Point,
    },
}

impl ComputerAction {
    pub fn from_arguments(args: &ToolArguments) -> Result<Self, PilotError> {
        let action = args.get_str("action")?;
        let coordinate = |label: &str| -> Result<Point, PilotError> {
            args.get_point_opt("coordinate")?.ok_or_else(|| {
                PilotError::InvalidArgument(format!("Coordinate required for {label} action"))
            })
        };
        let text = |message: &str| {
            args.get_str_opt("text")
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .ok_or_else(|| PilotError::InvalidArgument(message.to_string()))
        };

        match action {
            "screenshot" => Ok(Self::Screenshot),
            "wait" => {
                let requested = args
                    .get_f64_opt("duration")
                    .filter(|d| *d > 0.0)
                    .ok_or_else(|| {
                        PilotError::InvalidArgument("Duration required for wait action".into())
                    })?;
                Ok(Self::Wait {
                    seconds: requested.min(MAX_WAIT_SECS),
                })
            }
            "left_click" => Ok(Self::LeftClick(coordinate("left click")?)),
            "double_click" => Ok(Self::DoubleClick(coordinate("double click")?)),
            "right_click" => Ok(Self::RightClick(coordinate("right click")?)),
            "mouse_move" => Ok(Self::MouseMove(coordinate("mouse move")?)),
            "type" => Ok(Self::Type(text("Text required for type action")?)),
            "key" => Ok(Self::Key(text("Key required for key action")?)),
            "scroll" => {
                let direction = args
                    .get_str_opt("scroll_direction")
                    .ok_or_else(|| {
                        PilotError::InvalidArgument(
                            "Scroll direction required for scroll action".into(),
                        )
                    })?
                    .parse::<ScrollDirection>()
                    .map_err(|_| {
                        PilotError::InvalidArgument("Scroll direction must be up or down".into())
                    })?;
                let amount = args
                    .get_f64_opt("scroll_amount")
                    .map(f64::round)
                    .filter(|a| *a >= 1.0)
                    .ok_or_else(|| {
                        PilotError::InvalidArgument("Scroll amount required for scroll action".into())
                    })?;
                Ok(Self::Scroll {
                    direction,
                    amount: amount.min(f64::from(u32::MAX)) as u32,
                })
            }
            "left_click_drag" => {
                let start = args.get_point_opt("start_coordinate")?;
                let end = args.get_point_opt("coordinate")?;
                match (start, end) {
                    (Some(start), Some(end)) => Ok(Self::LeftClickDrag { start, end }),
                    _ => Err(PilotError::InvalidArgument(
                        "Start and end coordinates required for drag action".into(),
                    )),
                }
            }
            other => Err(PilotError::InvalidArgument(format!(
                "Unsupported action: {other}"
            ))),
        }
    }
}

/// Executor for the `computer` tool, bound to one desktop session.
pub struct ComputerTool {
    session: Arc<dyn DesktopSession>,
    description: String,
    parameters: ToolParameters,
}

impl ComputerTool {
    pub fn new(session: Arc<dyn DesktopSession>) -> Self {
        Self {
            session,
            description: computer_description(),
            parameters: computer_parameters(),
        }
    }

    async fn perform(&self, action: DesktopAction) -> Result<ActionOutput, PilotError> {
        tracing::debug!(
            sandbox_id = self.session.sandbox_id(),
            action = action.name(),
            "desktop action"
        );
        self.session.perform(action).await
    }

    async fn click(&self, at: Point, click: DesktopAction) -> Result<(), PilotError> {
        self.perform(DesktopAction::MoveMouse(at)).await?;
        self.perform(click).await?;
        Ok(())
    }

    /// Run a parsed action against the session.
    pub async fn run(&self, action: ComputerAction) -> Result<ToolPayload, PilotError> {
        match action {
            ComputerAction::Screenshot => match self.perform(DesktopAction::Screenshot).await? {
                ActionOutput::Image(bytes) => Ok(ToolPayload::Image {
                    data: STANDARD.encode(bytes),
                    mime_type: "image/png".to_string(),
                }),
                _ => Err(PilotError::Desktop("screenshot returned no image".into())),
            },
            ComputerAction::Wait { seconds } => {
                tokio::time::sleep(Duration::from_secs_f64(seconds)).await;
                Ok(ToolPayload::text(format!("Waited for {seconds} seconds")))
            }
            ComputerAction::LeftClick(at) => {
                self.click(at, DesktopAction::LeftClick).await?;
                Ok(ToolPayload::text(format!("Left clicked at {at}")))
            }
            ComputerAction::DoubleClick(at) => {
                self.click(at, DesktopAction::DoubleClick).await?;
                Ok(ToolPayload::text(format!("Double clicked at {at}")))
            }
            ComputerAction::RightClick(at) => {
                self.click(at, DesktopAction::RightClick).await?;
                Ok(ToolPayload::text(format!("Right clicked at {at}")))
            }
            ComputerAction::MouseMove(at) => {
                self.perform(DesktopAction::MoveMouse(at)).await?;
                Ok(ToolPayload::text(format!("Moved mouse to {at}")))
            }
            ComputerAction::Type(text) => {
                self.perform(DesktopAction::Write(text.clone())).await?;
                Ok(ToolPayload::text(format!("Typed: {text}")))
            }
            ComputerAction::Key(key) => {
                let session_key = if key == "Return" { "enter" } else { key.as_str() };
                self.perform(DesktopAction::Press(session_key.to_string()))
                    .await?;
                Ok(ToolPayload::text(format!("Pressed key: {key}")))
            }
            ComputerAction::Scroll { direction, amount } => {
                self.perform(DesktopAction::Scroll { direction, amount })
                    .await?;
                Ok(ToolPayload::text(format!("Scrolled {direction} by {amount}")))
            }
            ComputerAction::LeftClickDrag { start, end } => {
                self.perform(DesktopAction::Drag {
                    from: start,
                    to: end,
                })
                .await?;
                Ok(ToolPayload::text(format!(
                    "Dragged mouse from {start} to {end}"
                )))
            }
        }
    }
}

#[async_trait]
impl Tool for ComputerTool {
    fn name(&self) -> &str {
        COMPUTER_TOOL_NAME
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        _ctx: &ToolExecutionContext,
    ) -> Result<ToolPayload, PilotError> {
        let action = ComputerAction::from_arguments(args)?;
        self.run(action).await
    }
}

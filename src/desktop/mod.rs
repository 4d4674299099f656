//! Desktop session collaborator: the opaque remote machine tools act on.
//!
//! The orchestration core only ever does two things with a session: ask it to
//! perform an action and force it to terminate. Creating, pooling and
//! connecting sessions happens elsewhere.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::PilotError;

/// Screen resolution the computer tool advertises to the model.
pub const SCREEN_RESOLUTION: Resolution = Resolution {
    width: 1024,
    height: 768,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A pixel position on the remote screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
}

/// A single primitive the remote session knows how to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum DesktopAction {
    Screenshot,
    MoveMouse(Point),
    LeftClick,
    DoubleClick,
    RightClick,
    /// Type a literal string.
    Write(String),
    /// Press a single named key.
    Press(String),
    Scroll {
        direction: ScrollDirection,
        amount: u32,
    },
    Drag {
        from: Point,
        to: Point,
    },
    RunCommand(String),
}

impl DesktopAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Screenshot => "screenshot",
            Self::MoveMouse(_) => "move_mouse",
            Self::LeftClick => "left_click",
            Self::DoubleClick => "double_click",
            Self::RightClick => "right_click",
            Self::Write(_) => "write",
            Self::Press(_) => "press",
            Self::Scroll { .. } => "scroll",
            Self::Drag { .. } => "drag",
            Self::RunCommand(_) => "run_command",
        }
    }
}

/// What a session returns for an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutput {
    /// The action had no payload.
    Done,
    /// Raw framebuffer capture (PNG bytes).
    Image(Vec<u8>),
    Command(CommandOutput),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Handle to a remote, stateful desktop.
#[async_trait]
pub trait DesktopSession: Send + Sync {
    /// Identifier of the sandbox backing this session.
    fn sandbox_id(&self) -> &str;

    /// Perform one action on the remote machine.
    async fn perform(&self, action: DesktopAction) -> Result<ActionOutput, PilotError>;

    /// Force-terminate the remote machine.
    async fn kill(&self) -> Result<(), PilotError>;
}

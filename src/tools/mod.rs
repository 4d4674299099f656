//! Tool system: schemas, executors, argument accumulation and dispatch.

pub mod arguments;
pub mod bash;
pub mod call;
pub mod computer;
pub mod dispatcher;
pub mod registry;
pub mod tool;
pub mod types;
pub mod validation;

pub use arguments::ToolArguments;
pub use bash::BashTool;
pub use call::{ToolCall, ToolCallState, ToolCallTracker};
pub use computer::{ComputerAction, ComputerTool};
pub use dispatcher::ToolDispatcher;
pub use registry::{BoundTools, ToolRegistry};
pub use tool::{Tool, ToolExecutionContext};
pub use types::{ToolDefinition, ToolParameters};

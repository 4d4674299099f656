//! Name-indexed tool registry and per-session binding.

use std::collections::HashMap;
use std::sync::Arc;

use super::bash::{bash_parameters, BashTool, BASH_DESCRIPTION, BASH_TOOL_NAME};
use super::computer::{
    computer_description, computer_parameters, ComputerTool, COMPUTER_TOOL_NAME,
};
use super::tool::Tool;
use super::types::ToolDefinition;
use crate::desktop::DesktopSession;

/// Builds an executor bound to one desktop session.
pub type ToolFactory = Arc<dyn Fn(Arc<dyn DesktopSession>) -> Arc<dyn Tool> + Send + Sync>;

#[derive(Clone)]
struct RegistryEntry {
    definition: ToolDefinition,
    factory: ToolFactory,
}

/// Static catalogue of the tools offered to the model.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    entries: Vec<RegistryEntry>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `computer` and `bash` tools.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(
            ToolDefinition {
                name: COMPUTER_TOOL_NAME.to_string(),
                description: computer_description(),
                parameters: computer_parameters().schema,
            },
            Arc::new(|session| Arc::new(ComputerTool::new(session)) as Arc<dyn Tool>),
        );
        registry.register(
            ToolDefinition {
                name: BASH_TOOL_NAME.to_string(),
                description: BASH_DESCRIPTION.to_string(),
                parameters: bash_parameters().schema,
            },
            Arc::new(|session| Arc::new(BashTool::new(session)) as Arc<dyn Tool>),
        );
        registry
    }

    /// Register a tool. A later registration under the same name replaces the earlier one.
    pub fn register(&mut self, definition: ToolDefinition, factory: ToolFactory) {
        self.entries.retain(|e| e.definition.name != definition.name);
        self.entries.push(RegistryEntry {
            definition,
            factory,
        });
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|e| e.definition.name.as_str())
            .collect()
    }

    pub fn definition(&self, name: &str) -> Option<&ToolDefinition> {
        self.entries
            .iter()
            .find(|e| e.definition.name == name)
            .map(|e| &e.definition)
    }

    /// Definitions in registration order, as sent to the model.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries.iter().map(|e| e.definition.clone()).collect()
    }

    /// Build one executor per tool against `session`.
    pub fn bind(&self, session: Arc<dyn DesktopSession>) -> BoundTools {
        let tools = self
            .entries
            .iter()
            .map(|entry| {
                let tool = (entry.factory)(Arc::clone(&session));
                (
                    entry.definition.name.clone(),
                    BoundTool {
                        definition: entry.definition.clone(),
                        executor: tool,
                    },
                )
            })
            .collect();
        BoundTools {
            sandbox_id: session.sandbox_id().to_string(),
            tools,
        }
    }
}

#[derive(Clone)]
pub struct BoundTool {
    pub definition: ToolDefinition,
    pub executor: Arc<dyn Tool>,
}

/// Executors bound to one session, reused for every call in an exchange.
#[derive(Clone)]
pub struct BoundTools {
    sandbox_id: String,
    tools: HashMap<String, BoundTool>,
}

impl BoundTools {
    pub fn get(&self, name: &str) -> Option<&BoundTool> {
        self.tools.get(name)
    }

    pub fn sandbox_id(&self) -> &str {
        &self.sandbox_id
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

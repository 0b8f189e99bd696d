use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chatgraph_core::{ChatGraphError, Tool, ToolDefinition};

/// Thread-safe name → tool map. Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn Tool>>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), ChatGraphError> {
        let mut tools = self
            .tools
            .write()
            .map_err(|e| ChatGraphError::Tool(format!("registry lock poisoned: {e}")))?;
        tools.insert(tool.name().to_string(), tool);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().ok()?.get(name).cloned()
    }

    /// Definitions of every registered tool, sorted by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let Ok(tools) = self.tools.read() else {
            return Vec::new();
        };
        let mut defs: Vec<ToolDefinition> =
            tools.values().map(|t| t.as_tool_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    pub fn len(&self) -> usize {
        self.tools.read().map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use std::sync::Arc;

use chatgraph_core::{ChatGraphError, Tool};
use serde_json::Value;

use crate::ToolRegistry;

/// Executes tool calls one at a time against a registry.
#[derive(Clone)]
pub struct SerialToolExecutor {
    registry: ToolRegistry,
}

impl SerialToolExecutor {
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>, ChatGraphError> {
        self.registry
            .get(name)
            .ok_or_else(|| ChatGraphError::ToolNotFound(name.to_string()))
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<Value, ChatGraphError> {
        let tool = self.lookup(name)?;
        tracing::debug!(tool = name, "executing tool");
        tool.call(args).await
    }

    /// Execute a tool that was waiting on an operator's answer.
    pub async fn execute_with_input(
        &self,
        name: &str,
        args: Value,
        input: Value,
    ) -> Result<Value, ChatGraphError> {
        let tool = self.lookup(name)?;
        tracing::debug!(tool = name, "executing tool with operator input");
        tool.call_with_input(args, input).await
    }
}

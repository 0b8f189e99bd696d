use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::ChatGraphError;

/// Schema of a tool as advertised to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema of the arguments object.
    pub parameters: Value,
}

/// A callable tool.
///
/// Tools that need an operator's answer before they can produce a result
/// return `true` from [`requires_input`](Tool::requires_input). The tool node
/// then suspends the graph instead of calling [`call`](Tool::call), and the
/// answer later arrives through [`call_with_input`](Tool::call_with_input).
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON Schema of the arguments, if the tool declares one.
    fn parameters(&self) -> Option<Value> {
        None
    }

    async fn call(&self, args: Value) -> Result<Value, ChatGraphError>;

    fn requires_input(&self) -> bool {
        false
    }

    /// Complete a call with an answer supplied from outside the graph.
    async fn call_with_input(&self, args: Value, _input: Value) -> Result<Value, ChatGraphError> {
        self.call(args).await
    }

    fn as_tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self
                .parameters()
                .unwrap_or_else(|| json!({"type": "object", "properties": {}})),
        }
    }
}

use async_trait::async_trait;
use chatgraph_core::{ChatGraphError, Tool};
use serde_json::{json, Value};

/// Asks a human operator for guidance.
///
/// The tool never runs on its own: the tool node suspends the graph with the
/// model's query, and the operator's answer arrives through
/// [`call_with_input`](Tool::call_with_input) on resume.
#[derive(Debug, Default, Clone, Copy)]
pub struct HumanAssistanceTool;

impl HumanAssistanceTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for HumanAssistanceTool {
    fn name(&self) -> &'static str {
        "human_assistance"
    }

    fn description(&self) -> &'static str {
        "Request assistance from a human. Use this when you need expert input or clarification."
    }

    fn parameters(&self) -> Option<Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question to put to the human expert"
                }
            },
            "required": ["query"]
        }))
    }

    fn requires_input(&self) -> bool {
        true
    }

    async fn call(&self, _args: Value) -> Result<Value, ChatGraphError> {
        Err(ChatGraphError::Tool(
            "human_assistance needs an operator answer; resume the graph with one".to_string(),
        ))
    }

    async fn call_with_input(&self, _args: Value, input: Value) -> Result<Value, ChatGraphError> {
        let answer = match input {
            Value::String(s) => s,
            Value::Object(ref map) => match map.get("data").or_else(|| map.get("answer")) {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => input.to_string(),
            },
            other => other.to_string(),
        };
        Ok(Value::String(format!("EXPERT GUIDANCE: {answer}")))
    }
}

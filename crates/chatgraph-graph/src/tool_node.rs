use async_trait::async_trait;
use chatgraph_core::{ChatGraphError, Message, ToolCall};
use chatgraph_tools::SerialToolExecutor;
use serde_json::{json, Value};

use crate::command::{interrupt, NodeOutput};
use crate::node::Node;
use crate::state::MessageState;
use crate::END;

/// Executes the tool calls on the last assistant message and appends one
/// tool message per call.
///
/// A call to a tool whose [`requires_input`](chatgraph_core::Tool::requires_input)
/// is true pauses the graph instead. The interrupt payload is
/// `{"tool_call_id", "tool", "args"}`; on resume every call of the turn runs
/// and the operator's answer goes to that tool's `call_with_input`.
pub struct ToolNode {
    executor: SerialToolExecutor,
}

impl ToolNode {
    pub fn new(executor: SerialToolExecutor) -> Self {
        Self { executor }
    }

    fn pending_calls(state: &MessageState) -> Result<Vec<ToolCall>, ChatGraphError> {
        let last = state
            .last_message()
            .ok_or_else(|| ChatGraphError::Graph("tool node received no messages".to_string()))?;
        Ok(last.tool_calls().to_vec())
    }

    /// The single call that needs operator input, if any.
    fn input_call<'a>(&self, calls: &'a [ToolCall]) -> Result<Option<&'a ToolCall>, ChatGraphError> {
        let mut needing = Vec::new();
        for call in calls {
            if self.executor.lookup(&call.name)?.requires_input() {
                needing.push(call);
            }
        }
        if needing.len() > 1 {
            return Err(ChatGraphError::TooManyToolCalls {
                limit: 1,
                found: needing.len(),
            });
        }
        Ok(needing.pop())
    }

    async fn run_calls(
        &self,
        mut state: MessageState,
        calls: Vec<ToolCall>,
        input: Option<Value>,
    ) -> Result<MessageState, ChatGraphError> {
        for call in calls {
            let tool = self.executor.lookup(&call.name)?;
            let result = match (&input, tool.requires_input()) {
                (Some(answer), true) => {
                    self.executor
                        .execute_with_input(&call.name, call.arguments.clone(), answer.clone())
                        .await?
                }
                _ => self.executor.execute(&call.name, call.arguments.clone()).await?,
            };
            let content = match result {
                Value::String(s) => s,
                other => other.to_string(),
            };
            state.messages.push(Message::tool(content, call.id));
        }
        Ok(state)
    }
}

#[async_trait]
impl Node<MessageState> for ToolNode {
    async fn process(
        &self,
        state: MessageState,
    ) -> Result<NodeOutput<MessageState>, ChatGraphError> {
        let calls = Self::pending_calls(&state)?;
        if calls.is_empty() {
            return Ok(state.into());
        }

        if let Some(call) = self.input_call(&calls)? {
            tracing::info!(tool = %call.name, call_id = %call.id, "tool needs operator input");
            return Ok(interrupt(json!({
                "tool_call_id": call.id,
                "tool": call.name,
                "args": call.arguments,
            })));
        }

        Ok(self.run_calls(state, calls, None).await?.into())
    }

    async fn resume(
        &self,
        state: MessageState,
        value: Value,
    ) -> Result<NodeOutput<MessageState>, ChatGraphError> {
        let calls = Self::pending_calls(&state)?;
        if calls.is_empty() {
            return Ok(state.into());
        }
        self.input_call(&calls)?;
        Ok(self.run_calls(state, calls, Some(value)).await?.into())
    }
}

/// Route to `"tools"` when the last message has tool calls, otherwise `END`.
pub fn tools_condition(state: &MessageState) -> String {
    match state.last_message() {
        Some(last) if last.has_tool_calls() => "tools".to_string(),
        _ => END.to_string(),
    }
}

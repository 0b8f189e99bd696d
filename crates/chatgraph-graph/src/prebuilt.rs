use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chatgraph_core::{
    ChatGraphError, ChatModel, ChatRequest, Message, Tool, ToolChoice, ToolDefinition,
};
use chatgraph_tools::{SerialToolExecutor, ToolRegistry};
use serde_json::Value;

use crate::builder::StateGraph;
use crate::checkpoint::Checkpointer;
use crate::command::NodeOutput;
use crate::compiled::CompiledGraph;
use crate::node::Node;
use crate::state::MessageState;
use crate::tool_node::{tools_condition, ToolNode};
use crate::{END, START};

/// Name of the node that extracts the structured answer.
pub const STRUCTURED_RESPONSE_NODE: &str = "structured_response";

/// Replaces a reply whose tool calls arrive after the turn limit is spent.
pub const TURN_LIMIT_REPLY: &str = "Sorry, need more steps to process this request.";

/// Schema the final answer is extracted into, exposed to the model as a
/// single forced tool.
#[derive(Debug, Clone)]
pub struct ResponseFormat {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

impl ResponseFormat {
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            schema,
        }
    }

    fn as_tool_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.schema.clone(),
        }
    }
}

/// Options for [`create_react_agent_with_options`].
#[derive(Default)]
pub struct ReactAgentOptions {
    /// Inserted as the first message when the history has no system message.
    pub system_prompt: Option<String>,
    pub checkpointer: Option<Arc<dyn Checkpointer>>,
    pub interrupt_before: Vec<String>,
    pub interrupt_after: Vec<String>,
    /// Stop once this many assistant messages follow the last user message.
    /// A reply that still asks for tools at that point is replaced by
    /// [`TURN_LIMIT_REPLY`], so no tool call is left unanswered.
    pub max_turns: Option<usize>,
    /// Reject model responses with more tool calls than this.
    pub max_tool_calls_per_turn: Option<usize>,
    pub response_format: Option<ResponseFormat>,
}

/// Calls the model with the full history and appends its reply.
struct ChatModelNode {
    model: Arc<dyn ChatModel>,
    tool_defs: Vec<ToolDefinition>,
    system_prompt: Option<String>,
    max_tool_calls: Option<usize>,
    max_turns: Option<usize>,
}

#[async_trait]
impl Node<MessageState> for ChatModelNode {
    async fn process(
        &self,
        mut state: MessageState,
    ) -> Result<NodeOutput<MessageState>, ChatGraphError> {
        if let Some(prompt) = &self.system_prompt {
            if !state.messages.iter().any(Message::is_system) {
                state.messages.insert(0, Message::system(prompt.clone()));
            }
        }

        let request = ChatRequest::new(state.messages.clone()).with_tools(self.tool_defs.clone());
        let response = self.model.chat(request).await?;

        if let Some(limit) = self.max_tool_calls {
            let found = response.message.tool_calls().len();
            if found > limit {
                return Err(ChatGraphError::TooManyToolCalls { limit, found });
            }
        }

        state.messages.push(response.message);
        if let Some(max) = self.max_turns {
            cut_off_at_turn_limit(&mut state, max);
        }
        Ok(state.into())
    }
}

/// Swap a tool-calling reply that used up the last turn for a final answer.
fn cut_off_at_turn_limit(state: &mut MessageState, max_turns: usize) {
    if state.turns_since_last_human() < max_turns {
        return;
    }
    let Some(last) = state.messages.last_mut() else {
        return;
    };
    if !last.has_tool_calls() {
        return;
    }
    tracing::debug!(max_turns, "turn limit reached with tool calls pending");
    let mut reply = Message::ai(TURN_LIMIT_REPLY);
    if let Some(id) = last.id() {
        reply = reply.with_id(id);
    }
    *last = reply;
}

/// Asks the model for the final answer in the configured format.
struct StructuredResponseNode {
    model: Arc<dyn ChatModel>,
    format: ResponseFormat,
}

#[async_trait]
impl Node<MessageState> for StructuredResponseNode {
    async fn process(
        &self,
        mut state: MessageState,
    ) -> Result<NodeOutput<MessageState>, ChatGraphError> {
        let request = ChatRequest::new(state.messages.clone())
            .with_tools(vec![self.format.as_tool_definition()])
            .with_tool_choice(ToolChoice::Specific(self.format.name.clone()));
        let response = self.model.chat(request).await?;

        let call = response
            .message
            .tool_calls()
            .iter()
            .find(|c| c.name == self.format.name)
            .ok_or_else(|| {
                ChatGraphError::Parsing(format!(
                    "model did not return a '{}' structured response",
                    self.format.name
                ))
            })?;
        state.structured_response = Some(call.arguments.clone());
        Ok(state.into())
    }
}

/// Create a ReAct agent with default options.
///
/// - `"agent"` calls the model with the history and tool definitions.
/// - `"tools"` runs the tool calls of the agent's reply.
///
/// The agent routes to `"tools"` while its reply has tool calls, otherwise
/// to `END`; `"tools"` always routes back to `"agent"`.
pub fn create_react_agent(
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn Tool>>,
) -> Result<CompiledGraph<MessageState>, ChatGraphError> {
    create_react_agent_with_options(model, tools, ReactAgentOptions::default())
}

pub fn create_react_agent_with_options(
    model: Arc<dyn ChatModel>,
    tools: Vec<Arc<dyn Tool>>,
    options: ReactAgentOptions,
) -> Result<CompiledGraph<MessageState>, ChatGraphError> {
    let registry = ToolRegistry::new();
    for tool in tools {
        registry.register(tool)?;
    }
    let tool_defs = registry.definitions();
    let tool_node = ToolNode::new(SerialToolExecutor::new(registry));

    let agent_node = ChatModelNode {
        model: model.clone(),
        tool_defs,
        system_prompt: options.system_prompt,
        max_tool_calls: options.max_tool_calls_per_turn,
        max_turns: options.max_turns,
    };

    let finish = if options.response_format.is_some() {
        STRUCTURED_RESPONSE_NODE
    } else {
        END
    };
    let router = move |state: &MessageState| match tools_condition(state) {
        route if route == END => finish.to_string(),
        route => route,
    };
    let path_map = HashMap::from([
        ("tools".to_string(), "tools".to_string()),
        (finish.to_string(), finish.to_string()),
    ]);

    let mut graph = StateGraph::new()
        .add_node("agent", agent_node)
        .add_node("tools", tool_node)
        .add_edge(START, "agent")
        .add_conditional_edges_with_path_map("agent", router, path_map)
        .add_edge("tools", "agent")
        .interrupt_before(options.interrupt_before)
        .interrupt_after(options.interrupt_after);

    if let Some(format) = options.response_format {
        graph = graph
            .add_node(STRUCTURED_RESPONSE_NODE, StructuredResponseNode { model, format })
            .add_edge(STRUCTURED_RESPONSE_NODE, END);
    }

    let mut compiled = graph.compile()?;
    if let Some(checkpointer) = options.checkpointer {
        compiled = compiled.with_checkpointer(checkpointer);
    }
    Ok(compiled)
}

//! Human-in-the-loop chatbot: a hand-built graph with a chatbot node, a tool
//! node, web search and a `human_assistance` tool.
//!
//! When the model asks for human assistance the graph pauses; the operator
//! answers on the console and the run resumes with that answer.
//!
//! Run with: cargo run -p human_in_the_loop
//! Requires ANTHROPIC_API_KEY and TAVILY_API_KEY.

use std::sync::Arc;

use async_trait::async_trait;
use chatgraph::config::{load_dotenv, AgentConfig, ChatGraphConfig};
use chatgraph::core::{ChatGraphError, ChatModel, ChatRequest, Message, ToolDefinition};
use chatgraph::graph::{
    tools_condition, CheckpointConfig, GraphResult, MemorySaver, MessageState, Node, NodeOutput,
    StateGraph, ToolNode, START,
};
use chatgraph::models::chat_model_from_config;
use chatgraph::tavily::{TavilyConfig, TavilySearchTool};
use chatgraph::tools::{HumanAssistanceTool, SerialToolExecutor, ToolRegistry};
use colored::Colorize;
use futures::StreamExt;
use rustyline::DefaultEditor;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const MODEL: &str = "anthropic:claude-3-5-sonnet-latest";

const SYSTEM_PROMPT: &str = "You are a helpful AI assistant that can use tools and request human assistance.
When you receive expert guidance from a human:
1. Acknowledge and incorporate their feedback directly
2. Use their guidance to provide more specific and relevant information
3. Ask follow-up questions if you need clarification
4. Build upon their expertise in your responses

Use the web search tool when you need current information or to verify facts.
Use the human assistance tool when you need expert input or clarification.";

const USER_INPUT: &str =
    "I need some expert guidance for building an AI agent. Could you request assistance for me?";

/// Calls the model with the tools bound and a cap on tool calls per reply.
struct Chatbot {
    model: Arc<dyn ChatModel>,
    tools: Vec<ToolDefinition>,
    system_prompt: String,
    max_tool_calls: usize,
}

#[async_trait]
impl Node<MessageState> for Chatbot {
    async fn process(
        &self,
        mut state: MessageState,
    ) -> Result<NodeOutput<MessageState>, ChatGraphError> {
        if !state.messages.iter().any(Message::is_system) {
            state.messages.insert(0, Message::system(self.system_prompt.as_str()));
        }

        let request = ChatRequest::new(state.messages.clone()).with_tools(self.tools.clone());
        let message = self.model.chat(request).await?.message;
        let found = message.tool_calls().len();
        if found > self.max_tool_calls {
            return Err(ChatGraphError::TooManyToolCalls {
                limit: self.max_tool_calls,
                found,
            });
        }

        state.messages.push(message);
        Ok(NodeOutput::State(state))
    }
}

fn pretty_print(message: &Message) {
    let header = format!(" {} message ", message.role());
    println!("{}", format!("{header:=^48}").bold());
    if !message.content().is_empty() {
        println!("{}", message.content());
    }
    for call in message.tool_calls() {
        println!("{} {} {}", "tool call:".yellow(), call.name, call.arguments);
    }
}

/// Messages from index `seen` on, minus the system prompt.
fn appended_since(messages: &[Message], seen: usize) -> impl Iterator<Item = &Message> {
    messages.iter().skip(seen).filter(|m| !m.is_system())
}

/// Print what the last step added and return the new history length.
fn print_since(messages: &[Message], seen: usize) -> usize {
    appended_since(messages, seen).for_each(pretty_print);
    messages.len()
}

/// Show the pending request and read the operator's answer.
fn ask_operator(editor: &mut DefaultEditor, request: &Value) -> Result<String, ChatGraphError> {
    println!("\n{}", "======= HUMAN ASSISTANCE REQUESTED =======".bold().magenta());
    if let Some(query) = request["args"]["query"].as_str() {
        println!("Query: {query}");
    }
    println!("Please provide your expert guidance:");
    editor
        .readline("> ")
        .map_err(|e| ChatGraphError::Tool(format!("failed to read operator input: {e}")))
}

#[tokio::main]
async fn main() -> Result<(), ChatGraphError> {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ChatGraphConfig::load_or_spec(MODEL)?;
    let model = chat_model_from_config(&config)?;

    let registry = ToolRegistry::new();
    registry.register(Arc::new(TavilySearchTool::new(
        TavilyConfig::new(config.resolve_search_api_key()?)
            .with_max_results(config.search.max_results as usize),
    )))?;
    registry.register(Arc::new(HumanAssistanceTool::new()))?;
    let tools = registry.definitions();
    // The human_assistance interrupt answers one call at a time.
    let settings = config.agent.with_fallback(AgentConfig {
        system_prompt: Some(SYSTEM_PROMPT.to_string()),
        max_tool_calls_per_turn: Some(1),
        ..Default::default()
    });
    let chatbot = Chatbot {
        model,
        tools,
        system_prompt: settings.system_prompt.unwrap_or_default(),
        max_tool_calls: settings.max_tool_calls_per_turn.unwrap_or(1),
    };

    let graph = StateGraph::new()
        .add_node("chatbot", chatbot)
        .add_node("tools", ToolNode::new(SerialToolExecutor::new(registry)))
        .add_conditional_edges("chatbot", tools_condition)
        .add_edge("tools", "chatbot")
        .add_edge(START, "chatbot")
        .compile()?
        .with_checkpointer(Arc::new(MemorySaver::new()));

    let thread = CheckpointConfig::new("1");
    let input = MessageState::with_messages(vec![Message::human(USER_INPUT)]);

    let mut pending = None;
    let mut seen = 0;
    let mut events = graph.stream(input, Some(thread.clone()));
    while let Some(event) = events.next().await {
        let event = event?;
        seen = print_since(&event.state.messages, seen);
        pending = event.interrupt;
    }
    drop(events);

    let mut editor = DefaultEditor::new()
        .map_err(|e| ChatGraphError::Config(format!("failed to open console: {e}")))?;
    while let Some(request) = pending.take() {
        let answer = ask_operator(&mut editor, &request)?;
        tracing::info!(thread = %thread.thread_id, "resuming with operator guidance");
        match graph.resume(Value::String(answer), thread.clone()).await? {
            GraphResult::Complete(state) => {
                seen = print_since(&state.messages, seen);
            }
            GraphResult::Interrupted {
                state,
                interrupt_value,
            } => {
                seen = print_since(&state.messages, seen);
                pending = Some(interrupt_value);
            }
        }
    }

    Ok(())
}

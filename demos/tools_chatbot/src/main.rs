//! Web-search chatbot: a ReAct agent with the Tavily search tool, wrapped in
//! an outer graph that prints each agent response.
//!
//! Run with: cargo run -p tools_chatbot
//! Requires ANTHROPIC_API_KEY and TAVILY_API_KEY.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chatgraph::config::{load_dotenv, AgentConfig, ChatGraphConfig};
use chatgraph::core::{ChatGraphError, Message, Tool};
use chatgraph::graph::{
    create_react_agent_with_options, CompiledGraph, FnNode, MessageState, Node, NodeOutput,
    ReactAgentOptions, StateGraph, END, START,
};
use chatgraph::models::chat_model_from_config;
use chatgraph::tavily::{TavilyConfig, TavilySearchTool};
use colored::Colorize;
use futures::StreamExt;
use tracing_subscriber::EnvFilter;

const MODEL: &str = "anthropic:claude-3-7-sonnet-latest";

const PROMPT: &str = "You are a helpful assistant. You have access to a web search tool that you should use when:
1. You need current information
2. You're asked about recent events
3. You need to verify facts
4. You're unsure about something
Always use the web search tool when appropriate, and explain to the user when you're searching for information.";

/// Runs the whole inner agent as a single outer node.
struct AgentNode {
    agent: CompiledGraph<MessageState>,
}

#[async_trait]
impl Node<MessageState> for AgentNode {
    async fn process(
        &self,
        state: MessageState,
    ) -> Result<NodeOutput<MessageState>, ChatGraphError> {
        let result = self.agent.invoke(state).await?;
        Ok(NodeOutput::State(result.into_state()))
    }
}

/// Stop once the agent has answered at least once.
fn should_continue(state: &MessageState) -> String {
    if state.messages.iter().any(Message::is_ai) {
        "end".to_string()
    } else {
        "continue".to_string()
    }
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
    let search = TavilySearchTool::new(
        TavilyConfig::new(config.resolve_search_api_key()?)
            .with_max_results(config.search.max_results as usize),
    );

    let settings = config.agent.with_fallback(AgentConfig {
        system_prompt: Some(PROMPT.to_string()),
        ..Default::default()
    });

    let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(search)];
    let agent = create_react_agent_with_options(
        model,
        tools,
        ReactAgentOptions {
            system_prompt: settings.system_prompt,
            max_turns: settings.max_turns,
            max_tool_calls_per_turn: settings.max_tool_calls_per_turn,
            ..Default::default()
        },
    )?;

    let print_response = FnNode::new(|state: MessageState| async move {
        println!("{}", "=======AI RESPONSE=======".bold().cyan());
        if let Some(last) = state.last_message() {
            println!("{}", last.content());
        }
        Ok(NodeOutput::State(state))
    });

    let workflow = StateGraph::new()
        .add_node("agent", AgentNode { agent })
        .add_node("print_response", print_response)
        .add_edge(START, "agent")
        .add_edge("agent", "print_response")
        .add_conditional_edges_with_path_map(
            "print_response",
            should_continue,
            HashMap::from([
                ("continue".to_string(), "agent".to_string()),
                ("end".to_string(), END.to_string()),
            ]),
        )
        .compile()?;

    let input = MessageState::with_messages(vec![Message::human(
        "what is the weather in singapore?",
    )]);
    let mut events = workflow.stream(input, None);
    while let Some(event) = events.next().await {
        let event = event?;
        tracing::debug!(node = %event.node, messages = event.state.messages.len(), "step");
    }

    Ok(())
}

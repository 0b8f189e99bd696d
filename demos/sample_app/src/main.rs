//! Single-node sample app: the outer graph turns a text field into a user
//! message, runs a tool-less agent on it and stores the reply.
//!
//! Run with: cargo run -p sample_app
//! Requires ANTHROPIC_API_KEY.

use async_trait::async_trait;
use chatgraph::config::{load_dotenv, AgentConfig, ChatGraphConfig};
use chatgraph::core::{ChatGraphError, Message};
use chatgraph::graph::{
    create_react_agent_with_options, CheckpointConfig, CompiledGraph, MessageState, Node,
    NodeOutput, ReactAgentOptions, State, StateGraph, END, START,
};
use chatgraph::models::chat_model_from_config;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const MODEL: &str = "anthropic:claude-3-5-sonnet-latest";
const PROMPT: &str =
    "You are a helpful assistant. Answer all questions except for those relating to Singapore.";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct AppState {
    input_field: String,
    output: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            input_field: "Change me to your input".to_string(),
            output: None,
        }
    }
}

impl State for AppState {
    fn merge(&mut self, other: Self) {
        self.input_field = other.input_field;
        if other.output.is_some() {
            self.output = other.output;
        }
    }
}

struct CallModel {
    agent: CompiledGraph<MessageState>,
}

#[async_trait]
impl Node<AppState> for CallModel {
    async fn process(&self, mut state: AppState) -> Result<NodeOutput<AppState>, ChatGraphError> {
        let input = MessageState::with_messages(vec![Message::human(state.input_field.clone())]);
        let reply = self.agent.invoke(input).await?.into_state();
        state.output = Some(match reply.last_message() {
            Some(last) => last.content().to_string(),
            None => "No response generated".to_string(),
        });
        Ok(NodeOutput::State(state))
    }
}

async fn run(input: AppState) -> Result<AppState, ChatGraphError> {
    let config = ChatGraphConfig::load_or_spec(MODEL)?;
    let settings = config.agent.with_fallback(AgentConfig {
        system_prompt: Some(PROMPT.to_string()),
        ..Default::default()
    });
    let agent = create_react_agent_with_options(
        chat_model_from_config(&config)?,
        Vec::new(),
        ReactAgentOptions {
            system_prompt: settings.system_prompt,
            max_turns: settings.max_turns,
            max_tool_calls_per_turn: settings.max_tool_calls_per_turn,
            ..Default::default()
        },
    )?;

    let graph = StateGraph::new()
        .add_node("call_model", CallModel { agent })
        .add_edge(START, "call_model")
        .add_edge("call_model", END)
        .compile()?;

    let result = graph
        .invoke_with_config(input, Some(CheckpointConfig::new("1")))
        .await?;
    Ok(result.into_state())
}

#[tokio::main]
async fn main() {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let input = AppState {
        input_field: "Hello, how are you?".to_string(),
        ..Default::default()
    };
    tracing::debug!(input = %input.input_field, "invoking graph");

    match run(input).await {
        Ok(result) => {
            println!("{} {}", "Input:".bold(), result.input_field);
            println!(
                "{} {}",
                "Output:".bold(),
                result.output.as_deref().unwrap_or_default()
            );
        }
        Err(e) => println!("{}", format!("Error running graph: {e}").red()),
    }
}

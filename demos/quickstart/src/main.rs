//! Quickstart: a ReAct agent with a weather tool, a structured response and
//! per-thread memory.
//!
//! Two questions are asked on the same thread, so the second run sees the
//! first run's history.
//!
//! Run with: cargo run -p quickstart
//! Requires ANTHROPIC_API_KEY (or a `chatgraph.toml` pointing elsewhere).

use std::sync::Arc;

use chatgraph::config::{load_dotenv, AgentConfig, CheckpointBackend, ChatGraphConfig};
use chatgraph::core::{ChatGraphError, Message, Tool};
use chatgraph::graph::{
    create_react_agent_with_options, CheckpointConfig, Checkpointer, MemorySaver, MessageState,
    ReactAgentOptions, ResponseFormat, StoreCheckpointer,
};
use chatgraph::models::chat_model_from_config;
use chatgraph::store::FileStore;
use chatgraph::tools::FnTool;
use colored::Colorize;
use serde_json::json;
use tracing_subscriber::EnvFilter;

const MODEL: &str = "anthropic:claude-3-7-sonnet-latest";
const PROMPT: &str = "Never answer questions about the weather in San Francisco";

fn get_weather() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new("get_weather", "Get weather for a given city.", |args| async move {
            match args["city"].as_str() {
                Some(city) => Ok(json!(format!("It's always sunny in {city}!"))),
                None => Err(ChatGraphError::Tool(
                    "get_weather requires a 'city' string".to_string(),
                )),
            }
        })
        .with_parameters(json!({
            "type": "object",
            "properties": {"city": {"type": "string"}},
            "required": ["city"],
        })),
    )
}

fn weather_response() -> ResponseFormat {
    ResponseFormat::new(
        "WeatherResponse",
        "Structured answer about the weather.",
        json!({
            "type": "object",
            "properties": {"conditions": {"type": "string"}},
            "required": ["conditions"],
        }),
    )
}

fn checkpointer(config: &ChatGraphConfig) -> Arc<dyn Checkpointer> {
    match config.checkpoint.backend {
        CheckpointBackend::Memory => Arc::new(MemorySaver::new()),
        CheckpointBackend::File => Arc::new(StoreCheckpointer::new(Arc::new(FileStore::new(
            &config.checkpoint.dir,
        )))),
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
    let settings = config.agent.with_fallback(AgentConfig {
        system_prompt: Some(PROMPT.to_string()),
        ..Default::default()
    });

    let agent = create_react_agent_with_options(
        model,
        vec![get_weather()],
        ReactAgentOptions {
            system_prompt: settings.system_prompt,
            max_turns: settings.max_turns,
            max_tool_calls_per_turn: settings.max_tool_calls_per_turn,
            checkpointer: Some(checkpointer(&config)),
            response_format: Some(weather_response()),
            ..Default::default()
        },
    )?;

    let thread = CheckpointConfig::new("1");
    tracing::info!(thread = %thread.thread_id, "starting conversation");
    for question in [
        "what is the weather in san francisco",
        "what is the weather in new york",
    ] {
        println!("{} {}", "user>".bold().green(), question);
        let input = MessageState::with_messages(vec![Message::human(question)]);
        let state = agent
            .invoke_with_config(input, Some(thread.clone()))
            .await?
            .into_state();

        if let Some(last) = state.last_message() {
            println!("{} {}", "assistant>".bold().cyan(), last.content());
        }
        match &state.structured_response {
            Some(response) => println!("{} {}", "structured>".bold().yellow(), response),
            None => println!("{}", "no structured response".dimmed()),
        }
        println!();
    }

    Ok(())
}

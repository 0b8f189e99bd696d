use std::sync::Arc;

use chatgraph_core::{ChatGraphError, ChatResponse, Message, Tool, ToolCall, ToolChoice};
use chatgraph_graph::{
    create_react_agent, create_react_agent_with_options, CheckpointConfig, MemorySaver,
    MessageState, ReactAgentOptions, ResponseFormat, StoreCheckpointer, TURN_LIMIT_REPLY,
};
use chatgraph_models::ScriptedChatModel;
use chatgraph_store::InMemoryStore;
use chatgraph_tools::FnTool;
use serde_json::json;

fn weather_tool() -> Arc<dyn Tool> {
    Arc::new(
        FnTool::new("get_weather", "Get weather for a given city.", |args| async move {
            let city = args["city"].as_str().unwrap_or("somewhere");
            Ok(json!(format!("It's always sunny in {city}!")))
        })
        .with_parameters(json!({
            "type": "object",
            "properties": {"city": {"type": "string"}},
            "required": ["city"]
        })),
    )
}

fn reply(message: Message) -> ChatResponse {
    ChatResponse {
        message,
        usage: None,
    }
}

fn weather_call(id: &str, city: &str) -> Message {
    Message::ai_with_tool_calls(
        "",
        vec![ToolCall {
            id: id.to_string(),
            name: "get_weather".to_string(),
            arguments: json!({ "city": city }),
        }],
    )
}

/// Ids of tool calls in `messages` that no tool message answers.
fn unanswered_calls(messages: &[Message]) -> Vec<String> {
    let answered: Vec<&str> = messages.iter().filter_map(|m| m.tool_call_id()).collect();
    messages
        .iter()
        .flat_map(|m| m.tool_calls())
        .filter(|call| !answered.contains(&call.id.as_str()))
        .map(|call| call.id.clone())
        .collect()
}

fn user(text: &str) -> MessageState {
    serde_json::from_value(json!({"messages": [{"role": "user", "content": text}]})).unwrap()
}

#[tokio::test]
async fn weather_in_singapore() {
    let model = ScriptedChatModel::new(vec![
        reply(weather_call("call-1", "singapore")),
        reply(Message::ai("It's always sunny in singapore!")),
    ]);
    let graph = create_react_agent(Arc::new(model.clone()), vec![weather_tool()]).unwrap();

    let result = graph
        .invoke(user("what is the weather in singapore?"))
        .await
        .unwrap();
    assert!(result.is_complete());
    let state = result.into_state();

    assert_eq!(state.messages.len(), 4);
    assert!(state.messages[2].is_tool());
    assert_eq!(state.messages[2].content(), "It's always sunny in singapore!");
    let last = state.last_message().unwrap();
    assert!(last.is_ai());
    assert!(!last.has_tool_calls());
    assert!(last.content().contains("It's always sunny in singapore!"));

    // Both model calls saw the tool definition.
    let requests = model.requests().await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools[0].name, "get_weather");
    assert_eq!(requests[1].messages.len(), 3);
}

#[tokio::test]
async fn model_error_propagates() {
    let model = Arc::new(ScriptedChatModel::new(vec![]));
    let graph = create_react_agent(model, vec![weather_tool()]).unwrap();

    let err = graph
        .invoke(MessageState::with_messages(vec![Message::human("hello")]))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("exhausted"));
}

#[tokio::test]
async fn system_prompt_inserted_once() {
    let model = ScriptedChatModel::new(vec![
        reply(weather_call("c1", "sf")),
        reply(Message::ai("Sorry, I can't help with that.")),
        reply(Message::ai("Second answer")),
    ]);
    let saver = Arc::new(MemorySaver::new());
    let graph = create_react_agent_with_options(
        Arc::new(model.clone()),
        vec![weather_tool()],
        ReactAgentOptions {
            system_prompt: Some("Never answer questions about the weather in San Francisco".into()),
            checkpointer: Some(saver),
            ..Default::default()
        },
    )
    .unwrap();

    let config = CheckpointConfig::new("1");
    graph
        .invoke_with_config(user("what is the weather in sf"), Some(config.clone()))
        .await
        .unwrap();
    let second = graph
        .invoke_with_config(user("what about new york?"), Some(config))
        .await
        .unwrap()
        .into_state();

    let systems = second.messages.iter().filter(|m| m.is_system()).count();
    assert_eq!(systems, 1);
    assert!(second.messages[0].is_system());

    for request in model.requests().await {
        assert_eq!(request.messages.iter().filter(|m| m.is_system()).count(), 1);
        assert!(request.messages[0].is_system());
    }
}

#[tokio::test]
async fn existing_system_message_is_kept() {
    let model = ScriptedChatModel::new(vec![reply(Message::ai("ok"))]);
    let graph = create_react_agent_with_options(
        Arc::new(model),
        vec![],
        ReactAgentOptions {
            system_prompt: Some("configured".into()),
            ..Default::default()
        },
    )
    .unwrap();

    let state = graph
        .invoke(MessageState::with_messages(vec![
            Message::system("caller supplied"),
            Message::human("hi"),
        ]))
        .await
        .unwrap()
        .into_state();
    assert_eq!(state.messages[0].content(), "caller supplied");
    assert_eq!(state.messages.len(), 3);
}

#[tokio::test]
async fn same_thread_strictly_extends_history() {
    let saver = Arc::new(StoreCheckpointer::new(Arc::new(InMemoryStore::new())));
    let model = ScriptedChatModel::new(vec![
        reply(weather_call("c1", "sf")),
        reply(Message::ai("Sunny in sf.")),
        reply(Message::ai("Also sunny in ny.")),
    ]);
    let graph = create_react_agent_with_options(
        Arc::new(model),
        vec![weather_tool()],
        ReactAgentOptions {
            checkpointer: Some(saver),
            ..Default::default()
        },
    )
    .unwrap();

    let config = CheckpointConfig::new("thread-extend");
    let first = graph
        .invoke_with_config(user("weather in sf?"), Some(config.clone()))
        .await
        .unwrap()
        .into_state();
    let second = graph
        .invoke_with_config(user("and in ny?"), Some(config.clone()))
        .await
        .unwrap()
        .into_state();

    assert!(second.messages.len() > first.messages.len());
    assert_eq!(&second.messages[..first.messages.len()], &first.messages[..]);
    assert_eq!(second.messages[first.messages.len()].content(), "and in ny?");
    assert_eq!(second.last_message().unwrap().content(), "Also sunny in ny.");

    let stored = graph.get_state(&config).await.unwrap().unwrap();
    assert_eq!(stored, second);
}

#[tokio::test]
async fn different_threads_do_not_share_history() {
    let model = ScriptedChatModel::new(vec![reply(Message::ai("a")), reply(Message::ai("b"))]);
    let graph = create_react_agent_with_options(
        Arc::new(model),
        vec![],
        ReactAgentOptions {
            checkpointer: Some(Arc::new(MemorySaver::new())),
            ..Default::default()
        },
    )
    .unwrap();

    graph
        .invoke_with_config(user("one"), Some(CheckpointConfig::new("x")))
        .await
        .unwrap();
    let other = graph
        .invoke_with_config(user("two"), Some(CheckpointConfig::new("y")))
        .await
        .unwrap()
        .into_state();
    assert_eq!(other.messages.len(), 2);
}

#[tokio::test]
async fn two_tool_calls_violate_single_call_limit() {
    let model = ScriptedChatModel::new(vec![reply(Message::ai_with_tool_calls(
        "",
        vec![
            ToolCall {
                id: "a".into(),
                name: "get_weather".into(),
                arguments: json!({"city": "sf"}),
            },
            ToolCall {
                id: "b".into(),
                name: "get_weather".into(),
                arguments: json!({"city": "ny"}),
            },
        ],
    ))]);
    let graph = create_react_agent_with_options(
        Arc::new(model),
        vec![weather_tool()],
        ReactAgentOptions {
            max_tool_calls_per_turn: Some(1),
            ..Default::default()
        },
    )
    .unwrap();

    let err = graph.invoke(user("compare")).await.unwrap_err();
    assert!(matches!(
        err,
        ChatGraphError::TooManyToolCalls { limit: 1, found: 2 }
    ));
}

#[tokio::test]
async fn max_turns_replaces_pending_tool_calls_with_final_reply() {
    let model = ScriptedChatModel::new(vec![
        reply(weather_call("c1", "a")),
        reply(weather_call("c2", "b")),
        reply(weather_call("c3", "c")),
    ]);
    let graph = create_react_agent_with_options(
        Arc::new(model.clone()),
        vec![weather_tool()],
        ReactAgentOptions {
            max_turns: Some(2),
            ..Default::default()
        },
    )
    .unwrap();

    let state = graph.invoke(user("loop")).await.unwrap().into_state();
    assert_eq!(state.turns_since_last_human(), 2);
    let last = state.last_message().unwrap();
    assert!(!last.has_tool_calls());
    assert_eq!(last.content(), TURN_LIMIT_REPLY);
    assert!(unanswered_calls(&state.messages).is_empty());
    assert_eq!(model.remaining().await, 1);
}

#[tokio::test]
async fn turn_limit_with_response_format_sends_no_unanswered_calls() {
    let model = ScriptedChatModel::new(vec![
        reply(weather_call("c1", "sf")),
        reply(Message::ai_with_tool_calls(
            "",
            vec![ToolCall {
                id: "s1".into(),
                name: "WeatherResponse".into(),
                arguments: json!({"conditions": "unknown"}),
            }],
        )),
        reply(Message::ai("Sunny in ny.")),
        reply(Message::ai_with_tool_calls(
            "",
            vec![ToolCall {
                id: "s2".into(),
                name: "WeatherResponse".into(),
                arguments: json!({"conditions": "sunny"}),
            }],
        )),
    ]);
    let graph = create_react_agent_with_options(
        Arc::new(model.clone()),
        vec![weather_tool()],
        ReactAgentOptions {
            max_turns: Some(1),
            checkpointer: Some(Arc::new(MemorySaver::new())),
            response_format: Some(ResponseFormat::new(
                "WeatherResponse",
                "Respond to the user in this format.",
                json!({"type": "object", "properties": {"conditions": {"type": "string"}}}),
            )),
            ..Default::default()
        },
    )
    .unwrap();
    let config = CheckpointConfig::new("limited");

    let state = graph
        .invoke_with_config(user("weather in sf?"), Some(config.clone()))
        .await
        .unwrap()
        .into_state();
    assert_eq!(state.structured_response, Some(json!({"conditions": "unknown"})));
    assert!(unanswered_calls(&state.messages).is_empty());

    let requests = model.requests().await;
    assert_eq!(requests.len(), 2);
    assert!(unanswered_calls(&requests[1].messages).is_empty());

    // A follow-up on the same thread starts from a history the provider accepts.
    let state = graph
        .invoke_with_config(user("and ny?"), Some(config))
        .await
        .unwrap()
        .into_state();
    assert_eq!(state.structured_response, Some(json!({"conditions": "sunny"})));
    let requests = model.requests().await;
    assert_eq!(requests.len(), 4);
    assert!(requests
        .iter()
        .all(|request| unanswered_calls(&request.messages).is_empty()));
}

#[tokio::test]
async fn structured_response_is_extracted_without_touching_history() {
    let model = ScriptedChatModel::new(vec![
        reply(weather_call("c1", "sf")),
        reply(Message::ai("It's always sunny in sf!")),
        reply(Message::ai_with_tool_calls(
            "",
            vec![ToolCall {
                id: "s1".into(),
                name: "WeatherResponse".into(),
                arguments: json!({"conditions": "sunny"}),
            }],
        )),
    ]);
    let graph = create_react_agent_with_options(
        Arc::new(model.clone()),
        vec![weather_tool()],
        ReactAgentOptions {
            response_format: Some(ResponseFormat::new(
                "WeatherResponse",
                "Respond to the user in this format.",
                json!({
                    "type": "object",
                    "properties": {"conditions": {"type": "string"}},
                    "required": ["conditions"]
                }),
            )),
            ..Default::default()
        },
    )
    .unwrap();

    let state = graph.invoke(user("weather in sf?")).await.unwrap().into_state();
    assert_eq!(state.structured_response, Some(json!({"conditions": "sunny"})));
    assert_eq!(state.messages.len(), 4);
    assert_eq!(state.last_message().unwrap().content(), "It's always sunny in sf!");

    let requests = model.requests().await;
    let last = requests.last().unwrap();
    assert_eq!(
        last.tool_choice,
        Some(ToolChoice::Specific("WeatherResponse".into()))
    );
    assert_eq!(last.tools.len(), 1);
    assert_eq!(last.tools[0].name, "WeatherResponse");
}

#[tokio::test]
async fn structured_response_missing_call_is_a_parsing_error() {
    let model = ScriptedChatModel::new(vec![
        reply(Message::ai("done")),
        reply(Message::ai("no tool call here")),
    ]);
    let graph = create_react_agent_with_options(
        Arc::new(model),
        vec![],
        ReactAgentOptions {
            response_format: Some(ResponseFormat::new("Out", "", json!({"type": "object"}))),
            ..Default::default()
        },
    )
    .unwrap();

    let err = graph.invoke(user("hi")).await.unwrap_err();
    assert!(matches!(err, ChatGraphError::Parsing(_)));
}

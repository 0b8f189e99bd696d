use std::sync::Arc;

use chatgraph_core::{ChatResponse, Message, Tool, ToolCall};
use chatgraph_graph::{
    create_react_agent_with_options, CheckpointConfig, GraphResult, MemorySaver, MessageState,
    ReactAgentOptions,
};
use chatgraph_models::ScriptedChatModel;
use chatgraph_tools::HumanAssistanceTool;
use serde_json::json;

fn reply(message: Message) -> ChatResponse {
    ChatResponse {
        message,
        usage: None,
    }
}

fn ask_human(query: &str) -> Message {
    Message::ai_with_tool_calls(
        "Let me ask an expert.",
        vec![ToolCall {
            id: "toolu_1".into(),
            name: "human_assistance".into(),
            arguments: json!({ "query": query }),
        }],
    )
}

fn hitl_agent(model: ScriptedChatModel) -> chatgraph_graph::CompiledGraph<MessageState> {
    let tools: Vec<Arc<dyn Tool>> = vec![Arc::new(HumanAssistanceTool::new())];
    create_react_agent_with_options(
        Arc::new(model),
        tools,
        ReactAgentOptions {
            checkpointer: Some(Arc::new(MemorySaver::new())),
            max_tool_calls_per_turn: Some(1),
            ..Default::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn interrupt_then_resume_with_expert_answer() {
    let model = ScriptedChatModel::new(vec![
        reply(ask_human("Which agent framework should I use?")),
        reply(Message::ai("The expert recommends the graph builder.")),
    ]);
    let graph = hitl_agent(model.clone());
    let config = CheckpointConfig::new("hitl-1");

    let first = graph
        .invoke_with_config(
            MessageState::with_messages(vec![Message::human(
                "I need some expert guidance for building an AI agent.",
            )]),
            Some(config.clone()),
        )
        .await
        .unwrap();

    let GraphResult::Interrupted {
        state,
        interrupt_value,
    } = first
    else {
        panic!("expected the run to pause for the operator");
    };
    assert_eq!(interrupt_value["tool"], "human_assistance");
    assert_eq!(interrupt_value["tool_call_id"], "toolu_1");
    assert_eq!(
        interrupt_value["args"]["query"],
        "Which agent framework should I use?"
    );
    assert_eq!(state.messages.len(), 2);
    assert_eq!(model.remaining().await, 1);

    let done = graph
        .resume(json!("Use the graph builder."), config.clone())
        .await
        .unwrap();
    assert!(done.is_complete());
    let state = done.into_state();

    assert_eq!(state.messages.len(), 4);
    assert!(state.messages[2].is_tool());
    assert_eq!(state.messages[2].tool_call_id(), Some("toolu_1"));
    assert_eq!(
        state.messages[2].content(),
        "EXPERT GUIDANCE: Use the graph builder."
    );
    assert_eq!(
        state.last_message().unwrap().content(),
        "The expert recommends the graph builder."
    );
}

#[tokio::test]
async fn paused_thread_reports_pending_interrupt() {
    let model = ScriptedChatModel::new(vec![reply(ask_human("help?"))]);
    let graph = hitl_agent(model);
    let config = CheckpointConfig::new("hitl-2");

    graph
        .invoke_with_config(
            MessageState::with_messages(vec![Message::human("help me")]),
            Some(config.clone()),
        )
        .await
        .unwrap();

    let history = graph.get_state_history(&config).await.unwrap();
    let latest = history.last().unwrap();
    assert_eq!(latest.next_node.as_deref(), Some("tools"));
    assert_eq!(latest.interrupt.as_ref().unwrap()["tool"], "human_assistance");
}

#[tokio::test]
async fn two_simultaneous_calls_are_rejected() {
    let model = ScriptedChatModel::new(vec![reply(Message::ai_with_tool_calls(
        "",
        vec![
            ToolCall {
                id: "a".into(),
                name: "human_assistance".into(),
                arguments: json!({"query": "one"}),
            },
            ToolCall {
                id: "b".into(),
                name: "human_assistance".into(),
                arguments: json!({"query": "two"}),
            },
        ],
    ))]);
    let graph = hitl_agent(model);

    let err = graph
        .invoke_with_config(
            MessageState::with_messages(vec![Message::human("go")]),
            Some(CheckpointConfig::new("hitl-3")),
        )
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "model requested 2 tool calls in one turn (limit 1)"
    );
}

#[tokio::test]
async fn new_input_on_paused_thread_is_rejected() {
    let model = ScriptedChatModel::new(vec![
        reply(ask_human("help?")),
        reply(Message::ai("Thanks, noted.")),
    ]);
    let graph = hitl_agent(model.clone());
    let config = CheckpointConfig::new("hitl-3");

    let first = graph
        .invoke_with_config(
            MessageState::with_messages(vec![Message::human("help me")]),
            Some(config.clone()),
        )
        .await
        .unwrap();
    assert!(first.is_interrupted());

    let err = graph
        .invoke_with_config(
            MessageState::with_messages(vec![Message::human("never mind")]),
            Some(config.clone()),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("waiting on an interrupt"), "{err}");
    assert_eq!(model.requests().await.len(), 1);

    // The paused call is still answerable and every tool call gets a result.
    let state = graph
        .resume(json!("Start small."), config)
        .await
        .unwrap()
        .into_state();
    let answered: Vec<&str> = state
        .messages
        .iter()
        .filter_map(|m| m.tool_call_id())
        .collect();
    assert_eq!(answered, vec!["toolu_1"]);
    assert!(state
        .messages
        .iter()
        .all(|m| !m.is_human() || m.content() != "never mind"));
}

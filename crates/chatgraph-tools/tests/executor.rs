use std::sync::Arc;

use chatgraph_core::{ChatGraphError, Tool};
use chatgraph_tools::{FnTool, HumanAssistanceTool, SerialToolExecutor, ToolRegistry};
use serde_json::json;

fn registry_with_echo() -> ToolRegistry {
    let registry = ToolRegistry::new();
    let echo = FnTool::new("echo", "Echo the arguments back", |args| async move {
        Ok(json!({ "echo": args }))
    })
    .with_parameters(json!({
        "type": "object",
        "properties": { "text": { "type": "string" } }
    }));
    registry.register(Arc::new(echo)).unwrap();
    registry
}

#[tokio::test]
async fn executes_registered_tool() {
    let executor = SerialToolExecutor::new(registry_with_echo());
    let out = executor.execute("echo", json!({"text": "hi"})).await.unwrap();
    assert_eq!(out, json!({"echo": {"text": "hi"}}));
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let executor = SerialToolExecutor::new(ToolRegistry::new());
    let err = executor.execute("missing", json!({})).await.unwrap_err();
    assert!(matches!(err, ChatGraphError::ToolNotFound(name) if name == "missing"));
}

#[tokio::test]
async fn tool_errors_propagate() {
    let registry = ToolRegistry::new();
    registry
        .register(Arc::new(FnTool::new("boom", "Always fails", |_| async {
            Err(ChatGraphError::Tool("kaput".to_string()))
        })))
        .unwrap();
    let executor = SerialToolExecutor::new(registry);

    let err = executor.execute("boom", json!({})).await.unwrap_err();
    assert_eq!(err.to_string(), ChatGraphError::Tool("kaput".into()).to_string());
}

#[tokio::test]
async fn fn_tool_definition_uses_declared_schema() {
    let registry = registry_with_echo();
    let def = registry.get("echo").unwrap().as_tool_definition();
    assert_eq!(def.description, "Echo the arguments back");
    assert_eq!(def.parameters["properties"]["text"]["type"], "string");
}

#[tokio::test]
async fn human_assistance_wraps_operator_answer() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(HumanAssistanceTool::new())).unwrap();
    let executor = SerialToolExecutor::new(registry);

    let out = executor
        .execute_with_input(
            "human_assistance",
            json!({"query": "Which framework?"}),
            json!({"data": "Use the graph builder."}),
        )
        .await
        .unwrap();
    assert_eq!(out, json!("EXPERT GUIDANCE: Use the graph builder."));

    let plain = executor
        .execute_with_input("human_assistance", json!({"query": "?"}), json!("yes"))
        .await
        .unwrap();
    assert_eq!(plain, json!("EXPERT GUIDANCE: yes"));
}

#[tokio::test]
async fn human_assistance_refuses_to_run_without_input() {
    let tool = HumanAssistanceTool::new();
    assert!(tool.requires_input());
    assert!(tool.call(json!({"query": "?"})).await.is_err());
}

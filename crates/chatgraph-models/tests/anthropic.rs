use std::sync::Arc;

use chatgraph_config::ModelConfig;
use chatgraph_core::{ChatModel, ChatRequest, Message, ToolCall, ToolChoice, ToolDefinition};
use chatgraph_models::{
    chat_model_with_backend, AnthropicChatModel, AnthropicConfig, FakeBackend, ProviderResponse,
};
use serde_json::json;

fn weather_tool() -> ToolDefinition {
    ToolDefinition {
        name: "get_weather".to_string(),
        description: "Get weather for a given city.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {"city": {"type": "string"}},
            "required": ["city"]
        }),
    }
}

#[test]
fn build_request_shapes_body_and_headers() {
    let model = AnthropicChatModel::new(
        AnthropicConfig::new("sk-test", "claude-3-5-sonnet-latest").with_temperature(0.0),
        Arc::new(FakeBackend::new()),
    );
    let request = ChatRequest::new(vec![
        Message::system("be brief"),
        Message::human("weather?"),
    ])
    .with_tools(vec![weather_tool()])
    .with_tool_choice(ToolChoice::Specific("get_weather".into()));

    let req = model.build_request(&request);
    assert_eq!(req.url, "https://api.anthropic.com/v1/messages");
    assert!(req
        .headers
        .contains(&("x-api-key".to_string(), "sk-test".to_string())));
    assert!(req
        .headers
        .contains(&("anthropic-version".to_string(), "2023-06-01".to_string())));
    assert_eq!(req.body["model"], "claude-3-5-sonnet-latest");
    assert_eq!(req.body["max_tokens"], 1024);
    assert_eq!(req.body["system"], "be brief");
    assert_eq!(req.body["messages"].as_array().unwrap().len(), 1);
    assert_eq!(req.body["tools"][0]["input_schema"]["required"], json!(["city"]));
    assert_eq!(
        req.body["tool_choice"],
        json!({"type": "tool", "name": "get_weather"})
    );
}

#[tokio::test]
async fn chat_parses_text_and_tool_use() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 200,
        body: json!({
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "Let me check."},
                {"type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": {"city": "singapore"}}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 8}
        }),
    });
    let model = AnthropicChatModel::new(AnthropicConfig::new("k", "m"), backend.clone());

    let response = model
        .chat(ChatRequest::new(vec![Message::human("weather in singapore?")]))
        .await
        .unwrap();

    assert!(response.message.is_ai());
    assert_eq!(response.message.content(), "Let me check.");
    assert_eq!(response.message.id(), Some("msg_1"));
    assert_eq!(
        response.message.tool_calls(),
        &[ToolCall {
            id: "toolu_1".into(),
            name: "get_weather".into(),
            arguments: json!({"city": "singapore"}),
        }]
    );
    assert_eq!(response.usage.unwrap().total_tokens, 20);
    assert_eq!(backend.requests().await.len(), 1);
}

#[tokio::test]
async fn non_success_status_is_model_error() {
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 401,
        body: json!({"error": {"message": "invalid x-api-key"}}),
    });
    let model = AnthropicChatModel::new(AnthropicConfig::new("bad", "m"), backend);

    let err = model
        .chat(ChatRequest::new(vec![Message::human("hi")]))
        .await
        .unwrap_err();
    let text = err.to_string();
    assert!(text.contains("401"), "{text}");
    assert!(text.contains("invalid x-api-key"), "{text}");
}

#[test]
fn factory_rejects_unknown_provider() {
    let config = ModelConfig::from_spec("openai:gpt-4o").unwrap();
    let result = chat_model_with_backend(&config, "k".into(), Arc::new(FakeBackend::new()));
    assert!(result.is_err());
}

#[tokio::test]
async fn factory_applies_base_url() {
    let mut config = ModelConfig::from_spec("anthropic:claude-3-5-sonnet-latest").unwrap();
    config.base_url = Some("http://localhost:9999/".to_string());
    let backend = Arc::new(FakeBackend::new());
    backend.push_response(ProviderResponse {
        status: 200,
        body: json!({"content": [{"type": "text", "text": "ok"}]}),
    });

    let model = chat_model_with_backend(&config, "k".into(), backend.clone()).unwrap();
    model
        .chat(ChatRequest::new(vec![Message::human("hi")]))
        .await
        .unwrap();

    let sent = backend.requests().await;
    assert_eq!(sent[0].url, "http://localhost:9999/v1/messages");
}

//! Anthropic Messages API adapter.
//!
//! - URL: `{base_url}/v1/messages`
//! - Auth: `x-api-key: {key}` plus a pinned `anthropic-version` header
//! - System messages travel in the top-level `system` field, not in `messages`.
//! - Tool results are `tool_result` blocks inside a `user` turn; consecutive
//!   results are folded into one turn so roles keep alternating.

use std::sync::Arc;

use async_trait::async_trait;
use chatgraph_core::{
    ChatGraphError, ChatModel, ChatRequest, ChatResponse, Message, TokenUsage, ToolCall,
    ToolChoice, ToolDefinition,
};
use serde_json::{json, Value};

use crate::backend::{ProviderBackend, ProviderRequest, ProviderResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_API_VERSION: &str = "2023-06-01";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub base_url: String,
    pub api_version: String,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Chat model
// ---------------------------------------------------------------------------

pub struct AnthropicChatModel {
    config: AnthropicConfig,
    backend: Arc<dyn ProviderBackend>,
}

impl AnthropicChatModel {
    pub fn new(config: AnthropicConfig, backend: Arc<dyn ProviderBackend>) -> Self {
        Self { config, backend }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Build a `ProviderRequest` targeting the Messages endpoint.
    pub fn build_request(&self, request: &ChatRequest) -> ProviderRequest {
        let (system, messages) = messages_to_anthropic(&request.messages);

        let mut body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": messages,
        });

        if let Some(system) = system {
            body["system"] = json!(system);
        }
        if let Some(temp) = self.config.temperature {
            body["temperature"] = json!(temp);
        }
        if !request.tools.is_empty() {
            body["tools"] = json!(request
                .tools
                .iter()
                .map(tool_def_to_anthropic)
                .collect::<Vec<_>>());
        }
        if let Some(ref choice) = request.tool_choice {
            body["tool_choice"] = match choice {
                ToolChoice::Auto => json!({"type": "auto"}),
                ToolChoice::Required => json!({"type": "any"}),
                ToolChoice::None => json!({"type": "none"}),
                ToolChoice::Specific(name) => json!({"type": "tool", "name": name}),
            };
        }

        ProviderRequest {
            url: format!("{}/v1/messages", self.config.base_url.trim_end_matches('/')),
            headers: vec![
                ("x-api-key".to_string(), self.config.api_key.clone()),
                (
                    "anthropic-version".to_string(),
                    self.config.api_version.clone(),
                ),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body,
        }
    }
}

#[async_trait]
impl ChatModel for AnthropicChatModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ChatGraphError> {
        let provider_req = self.build_request(&request);
        tracing::debug!(
            model = %self.config.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending anthropic request"
        );
        let resp = self.backend.send(provider_req).await?;
        parse_response(&resp)
    }
}

// ---------------------------------------------------------------------------
// Wire conversion
// ---------------------------------------------------------------------------

/// Split a history into the `system` string and the alternating `messages` array.
pub(crate) fn messages_to_anthropic(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut out: Vec<Value> = Vec::new();

    for message in messages {
        match message {
            Message::System { content, .. } => system_parts.push(content),
            Message::Human { content, .. } => {
                out.push(json!({"role": "user", "content": content}));
            }
            Message::Ai {
                content,
                tool_calls,
                ..
            } => {
                let mut blocks = Vec::new();
                if !content.is_empty() {
                    blocks.push(json!({"type": "text", "text": content}));
                }
                for call in tool_calls {
                    blocks.push(json!({
                        "type": "tool_use",
                        "id": call.id,
                        "name": call.name,
                        "input": call.arguments,
                    }));
                }
                if blocks.is_empty() {
                    blocks.push(json!({"type": "text", "text": " "}));
                }
                out.push(json!({"role": "assistant", "content": blocks}));
            }
            Message::Tool {
                content,
                tool_call_id,
                ..
            } => {
                let block = json!({
                    "type": "tool_result",
                    "tool_use_id": tool_call_id,
                    "content": content,
                });
                match out.last_mut() {
                    Some(last) if is_tool_result_turn(last) => {
                        if let Some(blocks) = last["content"].as_array_mut() {
                            blocks.push(block);
                        }
                    }
                    _ => out.push(json!({"role": "user", "content": [block]})),
                }
            }
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, out)
}

fn is_tool_result_turn(turn: &Value) -> bool {
    turn["role"] == "user"
        && turn["content"]
            .as_array()
            .is_some_and(|blocks| blocks.iter().all(|b| b["type"] == "tool_result"))
}

pub(crate) fn tool_def_to_anthropic(def: &ToolDefinition) -> Value {
    json!({
        "name": def.name,
        "description": def.description,
        "input_schema": def.parameters,
    })
}

pub(crate) fn parse_response(resp: &ProviderResponse) -> Result<ChatResponse, ChatGraphError> {
    if !(200..300).contains(&resp.status) {
        return Err(ChatGraphError::Model(format!(
            "Anthropic API error ({}): {}",
            resp.status, resp.body
        )));
    }

    let blocks = resp.body["content"]
        .as_array()
        .ok_or_else(|| ChatGraphError::Parsing("response has no content array".to_string()))?;

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for block in blocks {
        match block["type"].as_str() {
            Some("text") => text.push_str(block["text"].as_str().unwrap_or_default()),
            Some("tool_use") => {
                let id = block["id"].as_str().ok_or_else(|| {
                    ChatGraphError::Parsing("tool_use block without id".to_string())
                })?;
                let name = block["name"].as_str().ok_or_else(|| {
                    ChatGraphError::Parsing("tool_use block without name".to_string())
                })?;
                tool_calls.push(ToolCall {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: block["input"].clone(),
                });
            }
            _ => {}
        }
    }

    let mut message = Message::ai_with_tool_calls(text, tool_calls);
    if let Some(id) = resp.body["id"].as_str() {
        message = message.with_id(id);
    }

    let usage = resp.body.get("usage").map(|u| {
        let input_tokens = u["input_tokens"].as_u64().unwrap_or(0) as u32;
        let output_tokens = u["output_tokens"].as_u64().unwrap_or(0) as u32;
        TokenUsage {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    });

    Ok(ChatResponse { message, usage })
}

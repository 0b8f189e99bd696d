use std::sync::Arc;

use chatgraph_config::{ChatGraphConfig, ModelConfig};
use chatgraph_core::{ChatGraphError, ChatModel};

use crate::anthropic::{AnthropicChatModel, AnthropicConfig};
use crate::backend::{HttpBackend, ProviderBackend};

/// Build the configured chat model over a real HTTP backend.
pub fn chat_model_from_config(
    config: &ChatGraphConfig,
) -> Result<Arc<dyn ChatModel>, ChatGraphError> {
    let api_key = config.resolve_api_key()?;
    chat_model_with_backend(&config.model, api_key, Arc::new(HttpBackend::new()))
}

/// Build the configured chat model over the given backend.
pub fn chat_model_with_backend(
    model: &ModelConfig,
    api_key: String,
    backend: Arc<dyn ProviderBackend>,
) -> Result<Arc<dyn ChatModel>, ChatGraphError> {
    match model.provider.as_str() {
        "anthropic" => {
            let mut cfg = AnthropicConfig::new(api_key, model.model.clone());
            if let Some(max_tokens) = model.max_tokens {
                cfg = cfg.with_max_tokens(max_tokens);
            }
            if let Some(temperature) = model.temperature {
                cfg = cfg.with_temperature(temperature);
            }
            if let Some(ref base_url) = model.base_url {
                cfg = cfg.with_base_url(base_url.clone());
            }
            Ok(Arc::new(AnthropicChatModel::new(cfg, backend)))
        }
        other => Err(ChatGraphError::Config(format!(
            "unsupported model provider '{other}'"
        ))),
    }
}

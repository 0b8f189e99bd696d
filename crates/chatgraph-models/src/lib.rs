mod anthropic;
mod backend;
mod factory;
mod scripted;

pub use anthropic::{
    AnthropicChatModel, AnthropicConfig, DEFAULT_API_VERSION, DEFAULT_BASE_URL,
    DEFAULT_MAX_TOKENS,
};
pub use backend::{FakeBackend, HttpBackend, ProviderBackend, ProviderRequest, ProviderResponse};
pub use factory::{chat_model_from_config, chat_model_with_backend};
pub use scripted::ScriptedChatModel;

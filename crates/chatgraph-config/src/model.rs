use chatgraph_core::ChatGraphError;
use serde::Deserialize;

/// Model provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Provider name; only "anthropic" is wired up.
    pub provider: String,
    /// Model identifier (e.g. "claude-3-5-sonnet-latest").
    pub model: String,
    /// Environment variable name containing the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
}

impl ModelConfig {
    /// Build from a `provider:model` string such as `anthropic:claude-3-7-sonnet-latest`.
    pub fn from_spec(spec: &str) -> Result<Self, ChatGraphError> {
        let (provider, model) = spec
            .split_once(':')
            .filter(|(p, m)| !p.is_empty() && !m.is_empty())
            .ok_or_else(|| {
                ChatGraphError::Config(format!(
                    "model spec '{spec}' is not of the form provider:model"
                ))
            })?;
        Ok(Self {
            provider: provider.to_string(),
            model: model.to_string(),
            api_key_env: default_api_key_env_for(provider),
            base_url: None,
            max_tokens: None,
            temperature: None,
        })
    }
}

fn default_api_key_env() -> String {
    "ANTHROPIC_API_KEY".to_string()
}

fn default_api_key_env_for(provider: &str) -> String {
    format!("{}_API_KEY", provider.to_ascii_uppercase())
}

use std::path::{Path, PathBuf};

use chatgraph_core::ChatGraphError;

use crate::{AgentConfig, ChatGraphConfig, CheckpointSettings, ModelConfig, SearchConfig};

/// File formats a config file may be written in, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Where the active configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    File(PathBuf),
    /// No file was found; built from a `provider:model` string.
    ModelSpec(String),
}

const EXTENSIONS: &[&str] = &["toml", "json", "yaml", "yml"];

/// Config files consulted when no explicit path is given, in order:
/// `./chatgraph.{toml,json,yaml,yml}`, then `~/.chatgraph/config.*`.
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("chatgraph.{ext}")))
        .collect();
    if let Some(home) = dirs::home_dir() {
        let dir = home.join(".chatgraph");
        paths.extend(EXTENSIONS.iter().map(|ext| dir.join(format!("config.{ext}"))));
    }
    paths
}

impl ChatGraphConfig {
    /// Parse and validate configuration text.
    pub fn parse(content: &str, format: ConfigFormat) -> Result<Self, ChatGraphError> {
        let config: Self = match format {
            ConfigFormat::Toml => toml::from_str(content)
                .map_err(|e| ChatGraphError::Config(format!("TOML parse error: {e}")))?,
            ConfigFormat::Json => serde_json::from_str(content)
                .map_err(|e| ChatGraphError::Config(format!("JSON parse error: {e}")))?,
            ConfigFormat::Yaml => serde_yml::from_str(content)
                .map_err(|e| ChatGraphError::Config(format!("YAML parse error: {e}")))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Read one config file; the format follows its extension.
    pub fn read(path: &Path) -> Result<Self, ChatGraphError> {
        let format = ConfigFormat::from_path(path).ok_or_else(|| {
            ChatGraphError::Config(format!(
                "{}: config files must end in .toml, .json, .yaml or .yml",
                path.display()
            ))
        })?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            ChatGraphError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::parse(&content, format).map_err(|e| match e {
            ChatGraphError::Config(msg) => {
                ChatGraphError::Config(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Load an explicit file, or the first of [`search_paths`] that exists.
    pub fn load(path: Option<&Path>) -> Result<Self, ChatGraphError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(ChatGraphError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            return Self::read(path);
        }
        match Self::discover(&search_paths())? {
            Some((config, _)) => Ok(config),
            None => Err(ChatGraphError::Config(
                "no config file found: tried ./chatgraph.{toml,json,yaml,yml} and ~/.chatgraph/config.*"
                    .to_string(),
            )),
        }
    }

    /// Defaults for every section around a `provider:model` spec.
    pub fn from_model_spec(spec: &str) -> Result<Self, ChatGraphError> {
        Ok(Self {
            model: ModelConfig::from_spec(spec)?,
            agent: AgentConfig::default(),
            search: SearchConfig::default(),
            checkpoint: CheckpointSettings::default(),
        })
    }

    /// Load from disk when a config file exists, otherwise fall back to `spec`.
    ///
    /// A file that exists but does not parse is an error, not a reason to
    /// fall back.
    pub fn load_or_spec(spec: &str) -> Result<Self, ChatGraphError> {
        let (config, origin) = Self::resolve(&search_paths(), spec)?;
        match &origin {
            ConfigOrigin::File(path) => {
                tracing::info!(path = %path.display(), model = %config.model.model, "loaded config");
            }
            ConfigOrigin::ModelSpec(spec) => {
                tracing::debug!(%spec, "no config file, using model spec");
            }
        }
        Ok(config)
    }

    /// [`load_or_spec`](Self::load_or_spec) over an explicit list of candidates,
    /// reporting which one won.
    pub fn resolve(
        candidates: &[PathBuf],
        spec: &str,
    ) -> Result<(Self, ConfigOrigin), ChatGraphError> {
        match Self::discover(candidates)? {
            Some(found) => Ok(found),
            None => Ok((
                Self::from_model_spec(spec)?,
                ConfigOrigin::ModelSpec(spec.to_string()),
            )),
        }
    }

    fn discover(candidates: &[PathBuf]) -> Result<Option<(Self, ConfigOrigin)>, ChatGraphError> {
        let Some(path) = candidates.iter().find(|p| p.exists()) else {
            return Ok(None);
        };
        let config = Self::read(path)?;
        Ok(Some((config, ConfigOrigin::File(path.clone()))))
    }

    /// Reject values that parse but cannot drive an agent.
    fn validate(&self) -> Result<(), ChatGraphError> {
        if self.model.provider.trim().is_empty() || self.model.model.trim().is_empty() {
            return Err(ChatGraphError::Config(
                "model.provider and model.model must not be empty".to_string(),
            ));
        }
        if self.search.max_results == 0 {
            return Err(ChatGraphError::Config(
                "search.max_results must be at least 1".to_string(),
            ));
        }
        for (field, value) in [
            ("agent.max_turns", self.agent.max_turns),
            ("agent.max_tool_calls_per_turn", self.agent.max_tool_calls_per_turn),
        ] {
            if value == Some(0) {
                return Err(ChatGraphError::Config(format!("{field} must be at least 1")));
            }
        }
        Ok(())
    }

    /// API key for the configured model provider.
    pub fn resolve_api_key(&self) -> Result<String, ChatGraphError> {
        resolve_env(&self.model.api_key_env, "model.api_key_env")
    }

    /// API key for the web search tool.
    pub fn resolve_search_api_key(&self) -> Result<String, ChatGraphError> {
        resolve_env(&self.search.api_key_env, "search.api_key_env")
    }
}

fn resolve_env(name: &str, field: &str) -> Result<String, ChatGraphError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        Ok(_) => Err(ChatGraphError::Config(format!(
            "environment variable '{name}' is empty (named by {field})"
        ))),
        Err(_) => Err(ChatGraphError::Config(format!(
            "environment variable '{name}' not set (named by {field})"
        ))),
    }
}

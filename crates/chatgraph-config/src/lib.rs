mod agent;
mod checkpoint;
mod loader;
mod model;
mod search;

pub use agent::AgentConfig;
pub use checkpoint::{CheckpointBackend, CheckpointSettings};
pub use loader::{search_paths, ConfigFormat, ConfigOrigin};
pub use model::ModelConfig;
pub use search::SearchConfig;

use serde::Deserialize;

/// Top-level configuration, loaded from TOML / JSON / YAML.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatGraphConfig {
    pub model: ModelConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub checkpoint: CheckpointSettings,
}

/// Load `.env` from the current directory or its parents, if one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env: {e}"),
    }
}

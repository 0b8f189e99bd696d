use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    #[default]
    Memory,
    File,
}

/// Where conversation checkpoints are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckpointSettings {
    #[serde(default)]
    pub backend: CheckpointBackend,
    /// Root directory for the file backend.
    #[serde(default = "default_dir")]
    pub dir: String,
}

impl Default for CheckpointSettings {
    fn default() -> Self {
        Self {
            backend: CheckpointBackend::default(),
            dir: default_dir(),
        }
    }
}

fn default_dir() -> String {
    ".chatgraph/checkpoints".to_string()
}

use thiserror::Error;

/// Errors produced anywhere in chatgraph.
#[derive(Debug, Error)]
pub enum ChatGraphError {
    #[error("model error: {0}")]
    Model(String),
    #[error("parsing error: {0}")]
    Parsing(String),
    #[error("tool error: {0}")]
    Tool(String),
    #[error("tool not found: {0}")]
    ToolNotFound(String),
    #[error("graph error: {0}")]
    Graph(String),
    #[error("store error: {0}")]
    Store(String),
    #[error("config error: {0}")]
    Config(String),
    /// The model asked for more tool calls in a single turn than the agent allows.
    #[error("model requested {found} tool calls in one turn (limit {limit})")]
    TooManyToolCalls { limit: usize, found: usize },
}

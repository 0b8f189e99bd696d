//! chatgraph: tool-calling chat agents on a small, checkpointed state graph.
//!
//! This crate re-exports the chatgraph sub-crates for single-import usage.
//! Enable features to control which modules are available.
//!
//! # Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `default` | `models`, `tools`, `graph` |
//! | `agent` | `default` + `store`, `config` |
//! | `full` | `agent` + `tavily` |
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use chatgraph::core::Message;
//! use chatgraph::graph::{create_react_agent, MessageState};
//! use chatgraph::models::ScriptedChatModel;
//! ```

/// Core traits and types: Message, ChatModel, Tool, Store, ChatGraphError.
/// Always available.
pub use chatgraph_core as core;

/// Chat model adapters: Anthropic, plus the scripted test double and backends.
#[cfg(feature = "models")]
pub use chatgraph_models as models;

/// Tool registry and execution, closure tools, human assistance.
#[cfg(feature = "tools")]
pub use chatgraph_tools as tools;

/// Tavily web search tool.
#[cfg(feature = "tavily")]
pub use chatgraph_tavily as tavily;

/// Key-value stores: in-memory and filesystem.
#[cfg(feature = "store")]
pub use chatgraph_store as store;

/// Configuration loading (TOML / JSON / YAML) and `.env` support.
#[cfg(feature = "config")]
pub use chatgraph_config as config;

/// StateGraph, CompiledGraph, ToolNode, checkpointing, prebuilt ReAct agent.
#[cfg(feature = "graph")]
pub use chatgraph_graph as graph;

//! A small conversational state machine.
//!
//! Build a [`StateGraph`] from [`Node`]s and edges, compile it into a
//! [`CompiledGraph`], and drive it with `invoke`, `stream`, or `resume`.
//! [`create_react_agent`] assembles the usual model → tools → model loop.

mod builder;
mod checkpoint;
mod command;
mod compiled;
mod edge;
mod node;
mod prebuilt;
mod state;
mod store_checkpointer;
mod tool_node;

pub use builder::StateGraph;
pub use checkpoint::{Checkpoint, CheckpointConfig, Checkpointer, MemorySaver};
pub use command::{interrupt, Command, GraphResult, NodeOutput};
pub use compiled::{CompiledGraph, GraphEvent, GraphStream, StateSnapshot, DEFAULT_RECURSION_LIMIT};
pub use edge::{ConditionalEdge, Edge, RouterFn};
pub use node::{FnNode, Node};
pub use prebuilt::{
    create_react_agent, create_react_agent_with_options, ReactAgentOptions, ResponseFormat,
    STRUCTURED_RESPONSE_NODE, TURN_LIMIT_REPLY,
};
pub use state::{MessageState, State};
pub use store_checkpointer::StoreCheckpointer;
pub use tool_node::{tools_condition, ToolNode};

/// Sentinel name for the graph start point.
pub const START: &str = "__start__";
/// Sentinel name for the graph end point.
pub const END: &str = "__end__";

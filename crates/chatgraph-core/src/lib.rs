//! Core traits and types shared by every chatgraph crate.
//!
//! - [`Message`] and [`ToolCall`]: the conversation data model.
//! - [`ChatModel`], [`ChatRequest`], [`ChatResponse`]: the model boundary.
//! - [`Tool`] and [`ToolDefinition`]: what a model can call.
//! - [`Store`] and [`Item`]: namespaced key-value persistence.
//! - [`ChatGraphError`]: the single error type.

mod error;
mod message;
mod model;
mod store;
mod tool;

pub use error::ChatGraphError;
pub use message::{Message, ToolCall};
pub use model::{ChatModel, ChatRequest, ChatResponse, TokenUsage, ToolChoice};
pub use store::{Item, Store};
pub use tool::{Tool, ToolDefinition};

//! Tool plumbing: a shared [`ToolRegistry`], a [`SerialToolExecutor`] that
//! dispatches calls by name, closure-backed [`FnTool`]s, and the
//! [`HumanAssistanceTool`] that pauses a graph for an operator's answer.

mod executor;
mod fn_tool;
mod human;
mod registry;

pub use executor::SerialToolExecutor;
pub use fn_tool::FnTool;
pub use human::HumanAssistanceTool;
pub use registry::ToolRegistry;

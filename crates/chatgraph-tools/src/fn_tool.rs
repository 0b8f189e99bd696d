use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use chatgraph_core::{ChatGraphError, Tool};
use serde_json::Value;

type ToolFuture = Pin<Box<dyn Future<Output = Result<Value, ChatGraphError>> + Send>>;
type ToolFn = dyn Fn(Value) -> ToolFuture + Send + Sync;

/// A tool backed by an async closure.
///
/// ```ignore
/// let echo = FnTool::new("echo", "Echo the input", |args| async move { Ok(args) });
/// ```
pub struct FnTool {
    name: &'static str,
    description: &'static str,
    parameters: Option<Value>,
    func: Arc<ToolFn>,
}

impl FnTool {
    pub fn new<F, Fut>(name: &'static str, description: &'static str, func: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ChatGraphError>> + Send + 'static,
    {
        Self {
            name,
            description,
            parameters: None,
            func: Arc::new(move |args| Box::pin(func(args))),
        }
    }

    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters = Some(schema);
        self
    }
}

#[async_trait]
impl Tool for FnTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn parameters(&self) -> Option<Value> {
        self.parameters.clone()
    }

    async fn call(&self, args: Value) -> Result<Value, ChatGraphError> {
        (self.func)(args).await
    }
}

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;
use chatgraph_core::ChatGraphError;
use serde_json::Value;

use crate::command::NodeOutput;
use crate::State;

/// A node in the graph that processes state.
///
/// Nodes return `NodeOutput<S>`: either the replacement state or a
/// [`Command`](crate::Command) for routing, updates, and interrupts.
/// Returning `Ok(state.into())` is the common case.
#[async_trait]
pub trait Node<S: State>: Send + Sync {
    async fn process(&self, state: S) -> Result<NodeOutput<S>, ChatGraphError>;

    /// Re-run this node after it interrupted, with the caller's answer.
    ///
    /// The default ignores `value` and runs [`process`](Node::process) again.
    async fn resume(&self, state: S, _value: Value) -> Result<NodeOutput<S>, ChatGraphError> {
        self.process(state).await
    }
}

/// Wraps an async function as a Node.
pub struct FnNode<S, F, Fut>
where
    S: State,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<NodeOutput<S>, ChatGraphError>> + Send,
{
    func: F,
    _marker: PhantomData<fn(S)>,
}

impl<S, F, Fut> FnNode<S, F, Fut>
where
    S: State,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<NodeOutput<S>, ChatGraphError>> + Send,
{
    pub fn new(func: F) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<S, F, Fut> Node<S> for FnNode<S, F, Fut>
where
    S: State,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<NodeOutput<S>, ChatGraphError>> + Send,
{
    async fn process(&self, state: S) -> Result<NodeOutput<S>, ChatGraphError> {
        (self.func)(state).await
    }
}

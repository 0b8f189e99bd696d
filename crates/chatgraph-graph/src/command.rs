use serde_json::Value;

use crate::State;

/// A command returned from a node to control graph flow.
///
/// A command can merge an update into the state, override edge routing,
/// or pause the run with an interrupt.
///
/// ```ignore
/// use chatgraph_graph::{Command, NodeOutput, MessageState};
///
/// async fn triage(state: MessageState) -> Result<NodeOutput<MessageState>, ChatGraphError> {
///     Ok(NodeOutput::Command(Command::goto("summary")))
/// }
/// ```
pub struct Command<S: State> {
    pub(crate) update: Option<S>,
    pub(crate) goto: Option<String>,
    pub(crate) interrupt_value: Option<Value>,
}

impl<S: State> std::fmt::Debug for Command<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("has_update", &self.update.is_some())
            .field("goto", &self.goto)
            .field("interrupt_value", &self.interrupt_value)
            .finish()
    }
}

impl<S: State> Clone for Command<S> {
    fn clone(&self) -> Self {
        Self {
            update: self.update.clone(),
            goto: self.goto.clone(),
            interrupt_value: self.interrupt_value.clone(),
        }
    }
}

impl<S: State> Command<S> {
    /// Route to a specific node.
    pub fn goto(node: impl Into<String>) -> Self {
        Self {
            update: None,
            goto: Some(node.into()),
            interrupt_value: None,
        }
    }

    /// Merge `update` into the state, then route to `node`.
    pub fn goto_with_update(node: impl Into<String>, update: S) -> Self {
        Self {
            update: Some(update),
            goto: Some(node.into()),
            interrupt_value: None,
        }
    }

    /// Merge `update` into the state and follow the normal edges.
    pub fn update(update: S) -> Self {
        Self {
            update: Some(update),
            goto: None,
            interrupt_value: None,
        }
    }

    /// End the run after this node.
    pub fn end() -> Self {
        Self::goto(crate::END)
    }

    pub fn interrupt_value(&self) -> Option<&Value> {
        self.interrupt_value.as_ref()
    }
}

/// What a node can return from its `process()` method.
#[derive(Clone)]
pub enum NodeOutput<S: State> {
    /// The node's replacement for the state.
    State(S),
    /// A command controlling flow and state.
    Command(Command<S>),
}

impl<S: State + std::fmt::Debug> std::fmt::Debug for NodeOutput<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeOutput::State(s) => f.debug_tuple("NodeOutput::State").field(s).finish(),
            NodeOutput::Command(c) => f.debug_tuple("NodeOutput::Command").field(c).finish(),
        }
    }
}

impl<S: State> From<S> for NodeOutput<S> {
    fn from(state: S) -> Self {
        NodeOutput::State(state)
    }
}

/// The result of a graph invocation.
#[derive(Debug, Clone)]
pub enum GraphResult<S> {
    /// The run reached `END`.
    Complete(S),
    /// The run paused and is waiting for [`resume`](crate::CompiledGraph::resume).
    Interrupted { state: S, interrupt_value: Value },
}

impl<S> GraphResult<S> {
    pub fn state(&self) -> &S {
        match self {
            GraphResult::Complete(s) => s,
            GraphResult::Interrupted { state, .. } => state,
        }
    }

    pub fn into_state(self) -> S {
        match self {
            GraphResult::Complete(s) => s,
            GraphResult::Interrupted { state, .. } => state,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, GraphResult::Complete(_))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, GraphResult::Interrupted { .. })
    }

    pub fn interrupt_value(&self) -> Option<&Value> {
        match self {
            GraphResult::Interrupted {
                interrupt_value, ..
            } => Some(interrupt_value),
            _ => None,
        }
    }
}

/// Pause the run and hand `value` to the caller.
///
/// The state the node received is checkpointed unchanged with this node as
/// the next one to run, and the caller gets `GraphResult::Interrupted`.
/// [`CompiledGraph::resume`](crate::CompiledGraph::resume) re-enters the node
/// through [`Node::resume`](crate::Node::resume).
///
/// ```ignore
/// async fn approval(state: MessageState) -> Result<NodeOutput<MessageState>, ChatGraphError> {
///     Ok(interrupt(serde_json::json!({"question": "Approve this action?"})))
/// }
/// ```
pub fn interrupt<S: State>(value: Value) -> NodeOutput<S> {
    NodeOutput::Command(Command {
        update: None,
        goto: None,
        interrupt_value: Some(value),
    })
}

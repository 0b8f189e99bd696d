use std::collections::HashMap;
use std::sync::Arc;

use crate::State;

/// A fixed edge from source node to target node.
#[derive(Debug, Clone)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

/// A routing function that inspects state and returns a target node name.
pub type RouterFn<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

/// A conditional edge from source node to a dynamically chosen target.
pub struct ConditionalEdge<S: State> {
    pub source: String,
    pub router: RouterFn<S>,
    /// Optional label → target map. Targets are checked at compile time and
    /// router labels are translated through it at run time.
    pub path_map: Option<HashMap<String, String>>,
}

impl<S: State> ConditionalEdge<S> {
    pub(crate) fn route(&self, state: &S) -> String {
        let label = (self.router)(state);
        match &self.path_map {
            Some(map) => map.get(&label).cloned().unwrap_or(label),
            None => label,
        }
    }
}

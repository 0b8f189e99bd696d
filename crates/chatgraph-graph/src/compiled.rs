use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::Arc;

use chatgraph_core::ChatGraphError;
use futures::Stream;
use serde_json::{json, Value};

use crate::checkpoint::{Checkpoint, CheckpointConfig, Checkpointer};
use crate::command::{GraphResult, NodeOutput};
use crate::edge::{ConditionalEdge, Edge};
use crate::node::Node;
use crate::state::State;
use crate::END;

/// Steps a single run may take before it is aborted.
pub const DEFAULT_RECURSION_LIMIT: usize = 25;

/// One executed node, as yielded by [`CompiledGraph::stream`].
#[derive(Debug, Clone)]
pub struct GraphEvent<S> {
    pub node: String,
    /// State after the node ran (or the unchanged state, for an interrupt).
    pub state: S,
    /// Set on the final event when the run paused.
    pub interrupt: Option<Value>,
}

pub type GraphStream<'a, S> =
    Pin<Box<dyn Stream<Item = Result<GraphEvent<S>, ChatGraphError>> + Send + 'a>>;

/// A checkpointed state as seen by [`CompiledGraph::get_state_history`].
#[derive(Debug, Clone)]
pub struct StateSnapshot<S> {
    pub checkpoint_id: String,
    pub parent_id: Option<String>,
    pub state: S,
    pub next_node: Option<String>,
    pub interrupt: Option<Value>,
}

/// The compiled, executable graph.
pub struct CompiledGraph<S: State> {
    pub(crate) nodes: HashMap<String, Box<dyn Node<S>>>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) conditional_edges: Vec<ConditionalEdge<S>>,
    pub(crate) entry_point: String,
    pub(crate) interrupt_before: HashSet<String>,
    pub(crate) interrupt_after: HashSet<String>,
    pub(crate) checkpointer: Option<Arc<dyn Checkpointer>>,
    pub(crate) recursion_limit: usize,
}

impl<S: State> std::fmt::Debug for CompiledGraph<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledGraph")
            .field("entry_point", &self.entry_point)
            .field("node_count", &self.nodes.len())
            .field("edge_count", &self.edges.len())
            .field("conditional_edge_count", &self.conditional_edges.len())
            .field("recursion_limit", &self.recursion_limit)
            .finish()
    }
}

impl<S: State> CompiledGraph<S> {
    /// Set a checkpointer for state persistence.
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn node_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Execute the graph from its entry point without persistence.
    pub async fn invoke(&self, state: S) -> Result<GraphResult<S>, ChatGraphError> {
        self.invoke_with_config(state, None).await
    }

    /// Execute the graph, persisting under `config` when a checkpointer is set.
    ///
    /// If the thread already has a checkpoint, `input` is merged into the
    /// checkpointed state and the run continues from the checkpoint's next
    /// node (or the entry point, if the previous run finished).
    pub async fn invoke_with_config(
        &self,
        input: S,
        config: Option<CheckpointConfig>,
    ) -> Result<GraphResult<S>, ChatGraphError> {
        let run = Run::start(self, input, config).await?;
        run.finish().await
    }

    /// Continue a paused thread, handing `value` to the interrupted node.
    pub async fn resume(
        &self,
        value: Value,
        config: CheckpointConfig,
    ) -> Result<GraphResult<S>, ChatGraphError> {
        let run = Run::resume(self, value, config).await?;
        run.finish().await
    }

    /// Execute the graph, yielding one event per node.
    ///
    /// The stream ends at `END`, after an interrupt event, or after
    /// yielding an error.
    pub fn stream(&self, input: S, config: Option<CheckpointConfig>) -> GraphStream<'_, S> {
        Box::pin(async_stream::stream! {
            let mut run = match Run::start(self, input, config).await {
                Ok(run) => run,
                Err(e) => {
                    yield Err(e);
                    return;
                }
            };
            loop {
                match run.step().await {
                    Ok(Step::Ran { node }) => yield Ok(GraphEvent {
                        node,
                        state: run.state.clone(),
                        interrupt: None,
                    }),
                    Ok(Step::Interrupted { node, value }) => {
                        yield Ok(GraphEvent {
                            node,
                            state: run.state.clone(),
                            interrupt: Some(value),
                        });
                        break;
                    }
                    Ok(Step::Finished) => break,
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
            }
        })
    }

    /// Latest checkpointed state for a thread.
    pub async fn get_state(&self, config: &CheckpointConfig) -> Result<Option<S>, ChatGraphError> {
        let checkpointer = self.require_checkpointer()?;
        checkpointer
            .get(config)
            .await?
            .map(|cp| decode_state(cp.state))
            .transpose()
    }

    /// Every checkpointed state for a thread, oldest first.
    pub async fn get_state_history(
        &self,
        config: &CheckpointConfig,
    ) -> Result<Vec<StateSnapshot<S>>, ChatGraphError> {
        let checkpointer = self.require_checkpointer()?;
        checkpointer
            .list(config)
            .await?
            .into_iter()
            .map(|cp| {
                let interrupt = cp.pending_interrupt().cloned();
                Ok(StateSnapshot {
                    checkpoint_id: cp.id,
                    parent_id: cp.parent_id,
                    state: decode_state(cp.state)?,
                    next_node: cp.next_node,
                    interrupt,
                })
            })
            .collect()
    }

    /// Merge `update` into the latest checkpoint of a thread.
    ///
    /// A new checkpoint is written with the same next node, so a paused
    /// thread stays paused and can be resumed with the edited state.
    pub async fn update_state(
        &self,
        config: &CheckpointConfig,
        update: S,
    ) -> Result<(), ChatGraphError> {
        let checkpointer = self.require_checkpointer()?;
        let checkpoint = checkpointer.get(config).await?.ok_or_else(|| {
            ChatGraphError::Graph(format!("no checkpoint for thread '{}'", config.thread_id))
        })?;

        let mut state: S = decode_state(checkpoint.state.clone())?;
        state.merge(update);

        let mut updated = Checkpoint::new(encode_state(&state)?, checkpoint.next_node.clone())
            .with_parent(checkpoint.id.clone())
            .with_metadata("source", json!("update_state"));
        if let Some(pending) = checkpoint.pending_interrupt() {
            updated = updated.with_metadata("interrupt", pending.clone());
        }
        checkpointer.put(config, &updated).await?;
        tracing::debug!(thread = %config.thread_id, "state updated");
        Ok(())
    }

    fn require_checkpointer(&self) -> Result<&Arc<dyn Checkpointer>, ChatGraphError> {
        self.checkpointer
            .as_ref()
            .ok_or_else(|| ChatGraphError::Graph("no checkpointer configured".to_string()))
    }

    fn find_next_node(&self, current: &str, state: &S) -> String {
        for ce in &self.conditional_edges {
            if ce.source == current {
                return ce.route(state);
            }
        }

        for edge in &self.edges {
            if edge.source == current {
                return edge.target.clone();
            }
        }

        // No outgoing edge means END
        END.to_string()
    }
}

fn encode_state<S: State>(state: &S) -> Result<Value, ChatGraphError> {
    serde_json::to_value(state)
        .map_err(|e| ChatGraphError::Graph(format!("failed to serialize state: {e}")))
}

fn decode_state<S: State>(value: Value) -> Result<S, ChatGraphError> {
    serde_json::from_value(value)
        .map_err(|e| ChatGraphError::Graph(format!("failed to deserialize checkpoint state: {e}")))
}

enum Step {
    Ran { node: String },
    Interrupted { node: String, value: Value },
    Finished,
}

/// One execution of a compiled graph, advanced a node at a time.
struct Run<'g, S: State> {
    graph: &'g CompiledGraph<S>,
    config: Option<CheckpointConfig>,
    state: S,
    current: String,
    parent_id: Option<String>,
    steps: usize,
    resume_value: Option<Value>,
    skip_interrupt_before: bool,
}

impl<'g, S: State> Run<'g, S> {
    async fn start(
        graph: &'g CompiledGraph<S>,
        input: S,
        config: Option<CheckpointConfig>,
    ) -> Result<Self, ChatGraphError> {
        let mut state = input;
        let mut current = graph.entry_point.clone();
        let mut parent_id = None;

        if let (Some(checkpointer), Some(cfg)) = (&graph.checkpointer, &config) {
            if let Some(checkpoint) = checkpointer.get(cfg).await? {
                // New input would bypass the paused node and leave its work
                // (e.g. an unanswered tool call) in the history.
                if checkpoint.pending_interrupt().is_some() {
                    return Err(ChatGraphError::Graph(format!(
                        "thread '{}' is waiting on an interrupt; call resume",
                        cfg.thread_id
                    )));
                }
                let mut restored: S = decode_state(checkpoint.state)?;
                restored.merge(state);
                state = restored;
                if let Some(next) = checkpoint.next_node.filter(|n| n != END) {
                    current = next;
                }
                parent_id = Some(checkpoint.id);
                tracing::debug!(
                    thread = %cfg.thread_id,
                    next = %current,
                    "continuing from checkpoint"
                );
            }
        }

        Ok(Self {
            graph,
            config,
            state,
            current,
            parent_id,
            steps: 0,
            resume_value: None,
            skip_interrupt_before: false,
        })
    }

    async fn resume(
        graph: &'g CompiledGraph<S>,
        value: Value,
        config: CheckpointConfig,
    ) -> Result<Self, ChatGraphError> {
        let checkpointer = graph.require_checkpointer()?;
        let checkpoint = checkpointer.get(&config).await?.ok_or_else(|| {
            ChatGraphError::Graph(format!("no checkpoint for thread '{}'", config.thread_id))
        })?;
        let current = checkpoint
            .next_node
            .clone()
            .filter(|n| n != END)
            .ok_or_else(|| {
                ChatGraphError::Graph(format!(
                    "thread '{}' has finished; nothing to resume",
                    config.thread_id
                ))
            })?;

        tracing::info!(thread = %config.thread_id, node = %current, "resuming");
        Ok(Self {
            graph,
            state: decode_state(checkpoint.state)?,
            config: Some(config),
            current,
            parent_id: Some(checkpoint.id),
            steps: 0,
            resume_value: Some(value),
            skip_interrupt_before: true,
        })
    }

    async fn finish(mut self) -> Result<GraphResult<S>, ChatGraphError> {
        loop {
            match self.step().await? {
                Step::Ran { .. } => {}
                Step::Interrupted { value, .. } => {
                    return Ok(GraphResult::Interrupted {
                        state: self.state,
                        interrupt_value: value,
                    })
                }
                Step::Finished => return Ok(GraphResult::Complete(self.state)),
            }
        }
    }

    async fn step(&mut self) -> Result<Step, ChatGraphError> {
        if self.current == END {
            return Ok(Step::Finished);
        }
        if self.steps >= self.graph.recursion_limit {
            tracing::warn!(limit = self.graph.recursion_limit, node = %self.current, "recursion limit hit");
            return Err(ChatGraphError::Graph(format!(
                "recursion limit of {} reached without hitting END",
                self.graph.recursion_limit
            )));
        }

        let node_name = self.current.clone();
        let skip_before = std::mem::take(&mut self.skip_interrupt_before);
        if !skip_before && self.graph.interrupt_before.contains(&node_name) {
            let value = json!({ "interrupt_before": node_name });
            self.save(&node_name, Some(&node_name), Some(&value)).await?;
            tracing::info!(node = %node_name, "interrupted before node");
            return Ok(Step::Interrupted {
                node: node_name,
                value,
            });
        }

        let node = self
            .graph
            .nodes
            .get(&node_name)
            .ok_or_else(|| ChatGraphError::Graph(format!("node '{node_name}' not found")))?;

        tracing::debug!(node = %node_name, step = self.steps, "running node");
        let output = match self.resume_value.take() {
            Some(value) => node.resume(self.state.clone(), value).await?,
            None => node.process(self.state.clone()).await?,
        };
        self.steps += 1;

        let mut goto = None;
        match output {
            NodeOutput::State(state) => self.state = state,
            NodeOutput::Command(cmd) => {
                if let Some(value) = cmd.interrupt_value {
                    self.save(&node_name, Some(&node_name), Some(&value)).await?;
                    tracing::info!(node = %node_name, "node interrupted");
                    return Ok(Step::Interrupted {
                        node: node_name,
                        value,
                    });
                }
                if let Some(update) = cmd.update {
                    self.state.merge(update);
                }
                goto = cmd.goto;
            }
        }

        let next = goto.unwrap_or_else(|| self.graph.find_next_node(&node_name, &self.state));
        tracing::debug!(from = %node_name, to = %next, "routing");

        if self.graph.interrupt_after.contains(&node_name) {
            let value = json!({ "interrupt_after": node_name });
            self.save(&node_name, Some(&next), Some(&value)).await?;
            self.current = next;
            tracing::info!(node = %node_name, "interrupted after node");
            return Ok(Step::Interrupted {
                node: node_name,
                value,
            });
        }

        self.save(&node_name, Some(&next), None).await?;
        self.current = next;
        Ok(Step::Ran { node: node_name })
    }

    /// Write a checkpoint of the current state, if the run is persisted.
    async fn save(
        &mut self,
        source: &str,
        next: Option<&str>,
        interrupt: Option<&Value>,
    ) -> Result<(), ChatGraphError> {
        let (Some(checkpointer), Some(cfg)) = (&self.graph.checkpointer, &self.config) else {
            return Ok(());
        };

        let next_node = next.filter(|n| *n != END).map(str::to_string);
        let mut checkpoint = Checkpoint::new(encode_state(&self.state)?, next_node)
            .with_metadata("source", json!(source))
            .with_metadata("step", json!(self.steps));
        if let Some(parent) = &self.parent_id {
            checkpoint = checkpoint.with_parent(parent.clone());
        }
        if let Some(value) = interrupt {
            checkpoint = checkpoint.with_metadata("interrupt", value.clone());
        }

        checkpointer.put(cfg, &checkpoint).await?;
        tracing::debug!(
            thread = %cfg.thread_id,
            checkpoint = %checkpoint.id,
            source,
            "checkpoint saved"
        );
        self.parent_id = Some(checkpoint.id);
        Ok(())
    }
}

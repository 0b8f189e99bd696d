use std::collections::HashMap;

use async_trait::async_trait;
use chatgraph_core::ChatGraphError;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Configuration identifying a checkpoint (thread/conversation).
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    pub thread_id: String,
    /// Target a specific checkpoint. When `None`, operations target the
    /// latest checkpoint of the thread.
    pub checkpoint_id: Option<String>,
}

impl CheckpointConfig {
    pub fn new(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            checkpoint_id: None,
        }
    }

    pub fn with_checkpoint_id(
        thread_id: impl Into<String>,
        checkpoint_id: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            checkpoint_id: Some(checkpoint_id.into()),
        }
    }
}

/// A snapshot of graph state at a point in execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Time-ordered id; lexical order is creation order.
    pub id: String,
    pub state: serde_json::Value,
    /// The next node to execute, `None` once the run reached `END`.
    pub next_node: Option<String>,
    pub parent_id: Option<String>,
    /// `"source"`: the node that produced it. `"interrupt"`: the pending
    /// interrupt payload, when the run paused here.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Checkpoint {
    pub fn new(state: serde_json::Value, next_node: Option<String>) -> Self {
        Self {
            id: generate_checkpoint_id(),
            state,
            next_node,
            parent_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// The interrupt payload recorded when the run paused at this checkpoint.
    pub fn pending_interrupt(&self) -> Option<&serde_json::Value> {
        self.metadata.get("interrupt")
    }
}

/// Fixed-width hex of a strictly increasing nanosecond clock.
fn generate_checkpoint_id() -> String {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static LAST: AtomicU64 = AtomicU64::new(0);

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    let mut prev = LAST.load(Ordering::Relaxed);
    loop {
        let next = now.max(prev + 1);
        match LAST.compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return format!("{next:016x}"),
            Err(actual) => prev = actual,
        }
    }
}

/// Trait for persisting graph state checkpoints.
#[async_trait]
pub trait Checkpointer: Send + Sync {
    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: &Checkpoint,
    ) -> Result<(), ChatGraphError>;

    /// The checkpoint named by `config.checkpoint_id`, or the thread's latest.
    async fn get(&self, config: &CheckpointConfig) -> Result<Option<Checkpoint>, ChatGraphError>;

    /// All checkpoints for a thread, oldest first.
    async fn list(&self, config: &CheckpointConfig) -> Result<Vec<Checkpoint>, ChatGraphError>;
}

/// In-process checkpointer. History is lost when the process exits.
#[derive(Default)]
pub struct MemorySaver {
    threads: RwLock<HashMap<String, Vec<Checkpoint>>>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Checkpointer for MemorySaver {
    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: &Checkpoint,
    ) -> Result<(), ChatGraphError> {
        let mut threads = self.threads.write().await;
        let history = threads.entry(config.thread_id.clone()).or_default();
        match history.iter_mut().find(|c| c.id == checkpoint.id) {
            Some(existing) => *existing = checkpoint.clone(),
            None => history.push(checkpoint.clone()),
        }
        Ok(())
    }

    async fn get(&self, config: &CheckpointConfig) -> Result<Option<Checkpoint>, ChatGraphError> {
        let threads = self.threads.read().await;
        let Some(history) = threads.get(&config.thread_id) else {
            return Ok(None);
        };
        Ok(match &config.checkpoint_id {
            Some(id) => history.iter().find(|c| &c.id == id).cloned(),
            None => history.iter().max_by(|a, b| a.id.cmp(&b.id)).cloned(),
        })
    }

    async fn list(&self, config: &CheckpointConfig) -> Result<Vec<Checkpoint>, ChatGraphError> {
        let threads = self.threads.read().await;
        let mut history = threads
            .get(&config.thread_id)
            .cloned()
            .unwrap_or_default();
        history.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(history)
    }
}

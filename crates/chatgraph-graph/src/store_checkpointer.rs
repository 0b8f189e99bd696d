use std::sync::Arc;

use async_trait::async_trait;
use chatgraph_core::{ChatGraphError, Item, Store};

use crate::checkpoint::{Checkpoint, CheckpointConfig, Checkpointer};

const NAMESPACE: &str = "checkpoints";

/// `Checkpointer` backed by any [`Store`].
///
/// Checkpoints live under namespace `["checkpoints", "{thread_id}"]` with the
/// checkpoint id as the key, so a `FileStore` keeps one JSON file per
/// snapshot. Ids sort chronologically, so the newest checkpoint is the last
/// key and only that entry is read for `get`.
///
/// An entry that exists but cannot be decoded is a `Store` error; a thread
/// never silently falls back to an older snapshot.
pub struct StoreCheckpointer {
    store: Arc<dyn Store>,
}

impl StoreCheckpointer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn load(&self, thread_id: &str, id: &str) -> Result<Option<Checkpoint>, ChatGraphError> {
        self.store
            .get(&[NAMESPACE, thread_id], id)
            .await?
            .map(|item| decode(thread_id, item))
            .transpose()
    }
}

fn decode(thread_id: &str, item: Item) -> Result<Checkpoint, ChatGraphError> {
    serde_json::from_value(item.value).map_err(|e| {
        ChatGraphError::Store(format!(
            "corrupt checkpoint '{}' in thread '{thread_id}': {e}",
            item.key
        ))
    })
}

#[async_trait]
impl Checkpointer for StoreCheckpointer {
    async fn put(
        &self,
        config: &CheckpointConfig,
        checkpoint: &Checkpoint,
    ) -> Result<(), ChatGraphError> {
        let value = serde_json::to_value(checkpoint)
            .map_err(|e| ChatGraphError::Graph(format!("failed to serialize checkpoint: {e}")))?;
        self.store
            .put(&[NAMESPACE, &config.thread_id], &checkpoint.id, value)
            .await
    }

    async fn get(&self, config: &CheckpointConfig) -> Result<Option<Checkpoint>, ChatGraphError> {
        let thread_id = config.thread_id.as_str();
        if let Some(ref target_id) = config.checkpoint_id {
            return self.load(thread_id, target_id).await;
        }

        let keys = self.store.list_keys(&[NAMESPACE, thread_id]).await?;
        match keys.last() {
            Some(latest) => self.load(thread_id, latest).await,
            None => Ok(None),
        }
    }

    async fn list(&self, config: &CheckpointConfig) -> Result<Vec<Checkpoint>, ChatGraphError> {
        let thread_id = config.thread_id.as_str();
        let keys = self.store.list_keys(&[NAMESPACE, thread_id]).await?;
        let mut checkpoints = Vec::with_capacity(keys.len());
        for key in &keys {
            // A key deleted between listing and reading is simply gone.
            if let Some(checkpoint) = self.load(thread_id, key).await? {
                checkpoints.push(checkpoint);
            }
        }
        Ok(checkpoints)
    }
}

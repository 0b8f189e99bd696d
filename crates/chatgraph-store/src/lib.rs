use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

mod file_store;

pub use chatgraph_core::{ChatGraphError, Item, Store};
pub use file_store::FileStore;

fn namespace_key(namespace: &[&str]) -> String {
    namespace.join("::")
}

pub(crate) fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

pub(crate) fn matches_query(item: &Item, query: Option<&str>) -> bool {
    match query {
        Some(q) => item.key.contains(q) || item.value.to_string().contains(q),
        None => true,
    }
}

/// Thread-safe in-memory implementation of `Store`.
///
/// Items within a namespace are kept in key order, so `search` results are
/// sorted by key.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<HashMap<String, BTreeMap<String, Item>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get(&self, namespace: &[&str], key: &str) -> Result<Option<Item>, ChatGraphError> {
        let data = self.data.read().await;
        Ok(data
            .get(&namespace_key(namespace))
            .and_then(|ns| ns.get(key).cloned()))
    }

    async fn search(
        &self,
        namespace: &[&str],
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Item>, ChatGraphError> {
        let data = self.data.read().await;
        let Some(ns) = data.get(&namespace_key(namespace)) else {
            return Ok(vec![]);
        };

        Ok(ns
            .values()
            .filter(|item| matches_query(item, query))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn put(&self, namespace: &[&str], key: &str, value: Value) -> Result<(), ChatGraphError> {
        let mut data = self.data.write().await;
        let ns = data.entry(namespace_key(namespace)).or_default();
        let now = now_iso();

        let created_at = ns
            .get(key)
            .map(|existing| existing.created_at.clone())
            .unwrap_or_else(|| now.clone());

        ns.insert(
            key.to_string(),
            Item {
                namespace: namespace.iter().map(|s| s.to_string()).collect(),
                key: key.to_string(),
                value,
                created_at,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn delete(&self, namespace: &[&str], key: &str) -> Result<(), ChatGraphError> {
        let mut data = self.data.write().await;
        if let Some(ns) = data.get_mut(&namespace_key(namespace)) {
            ns.remove(key);
        }
        Ok(())
    }

    async fn list_keys(&self, namespace: &[&str]) -> Result<Vec<String>, ChatGraphError> {
        let data = self.data.read().await;
        Ok(data
            .get(&namespace_key(namespace))
            .map(|ns| ns.keys().cloned().collect())
            .unwrap_or_default())
    }
}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ChatGraphError;

/// A stored value with its location and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub namespace: Vec<String>,
    pub key: String,
    pub value: Value,
    pub created_at: String,
    pub updated_at: String,
}

/// Namespaced key-value storage.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, namespace: &[&str], key: &str) -> Result<Option<Item>, ChatGraphError>;

    /// List items in a namespace, optionally filtered by a substring of key or value.
    async fn search(
        &self,
        namespace: &[&str],
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Item>, ChatGraphError>;

    async fn put(&self, namespace: &[&str], key: &str, value: Value)
        -> Result<(), ChatGraphError>;

    async fn delete(&self, namespace: &[&str], key: &str) -> Result<(), ChatGraphError>;

    /// Keys stored directly in `namespace`, sorted ascending.
    async fn list_keys(&self, namespace: &[&str]) -> Result<Vec<String>, ChatGraphError>;
}

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chatgraph_core::{ChatGraphError, Item, Store};
use serde_json::Value;
use tokio::fs;

use crate::{matches_query, now_iso};

/// File-system backed implementation of `Store`.
///
/// Layout: `{root}/{namespace_path}/{key}.json`
/// where namespace_path joins namespace segments with `/`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_dir(&self, namespace: &[&str]) -> PathBuf {
        let mut path = self.root.clone();
        for part in namespace {
            path.push(part);
        }
        path
    }

    fn item_path(&self, namespace: &[&str], key: &str) -> PathBuf {
        self.namespace_dir(namespace).join(format!("{key}.json"))
    }

    /// `*.json` files directly under `dir`, sorted. File names are keys, so
    /// this is key order.
    async fn item_paths(dir: &Path) -> Result<Vec<PathBuf>, ChatGraphError> {
        if !dir.exists() {
            return Ok(vec![]);
        }
        let mut paths = Vec::new();
        let mut entries = fs::read_dir(dir)
            .await
            .map_err(|e| store_err("read dir", dir, e))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| store_err("read entry in", dir, e))?
        {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn store_err(action: &str, path: &Path, e: impl std::fmt::Display) -> ChatGraphError {
    ChatGraphError::Store(format!("failed to {action} {}: {e}", path.display()))
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, namespace: &[&str], key: &str) -> Result<Option<Item>, ChatGraphError> {
        let path = self.item_path(namespace, key);
        match fs::read_to_string(&path).await {
            Ok(content) => {
                let item: Item =
                    serde_json::from_str(&content).map_err(|e| store_err("parse", &path, e))?;
                Ok(Some(item))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(store_err("read", &path, e)),
        }
    }

    async fn search(
        &self,
        namespace: &[&str],
        query: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Item>, ChatGraphError> {
        let dir = self.namespace_dir(namespace);
        let paths = Self::item_paths(&dir).await?;

        let mut items = Vec::new();
        for path in paths {
            if items.len() >= limit {
                break;
            }
            let content = fs::read_to_string(&path)
                .await
                .map_err(|e| store_err("read", &path, e))?;
            let item: Item = match serde_json::from_str(&content) {
                Ok(item) => item,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "skipping malformed item: {e}");
                    continue;
                }
            };
            if matches_query(&item, query) {
                items.push(item);
            }
        }

        Ok(items)
    }

    async fn put(&self, namespace: &[&str], key: &str, value: Value) -> Result<(), ChatGraphError> {
        let dir = self.namespace_dir(namespace);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| store_err("create dir", &dir, e))?;

        let path = self.item_path(namespace, key);
        let now = now_iso();

        let created_at = match fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str::<Item>(&content)
                .map(|item| item.created_at)
                .unwrap_or_else(|_| now.clone()),
            Err(_) => now.clone(),
        };

        let item = Item {
            namespace: namespace.iter().map(|s| s.to_string()).collect(),
            key: key.to_string(),
            value,
            created_at,
            updated_at: now,
        };

        let json = serde_json::to_string_pretty(&item)
            .map_err(|e| ChatGraphError::Store(format!("failed to serialize: {e}")))?;
        fs::write(&path, json)
            .await
            .map_err(|e| store_err("write", &path, e))
    }

    async fn delete(&self, namespace: &[&str], key: &str) -> Result<(), ChatGraphError> {
        let path = self.item_path(namespace, key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(store_err("delete", &path, e)),
        }
    }

    async fn list_keys(&self, namespace: &[&str]) -> Result<Vec<String>, ChatGraphError> {
        let dir = self.namespace_dir(namespace);
        Ok(Self::item_paths(&dir)
            .await?
            .iter()
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect())
    }
}

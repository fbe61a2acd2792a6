//! Volatile in-process backend.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::KvStore;
use crate::error::Result;

/// In-memory [`KvStore`]; contents are lost when the process exits
#[derive(Debug, Default)]
pub struct MemoryKv {
    namespaces: RwLock<HashMap<String, HashMap<String, Vec<u8>>>>,
}

impl MemoryKv {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: &[u8]) -> Result<()> {
        let mut namespaces = self.namespaces.write().await;
        namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> Result<bool> {
        let mut namespaces = self.namespaces.write().await;
        Ok(namespaces
            .get_mut(namespace)
            .is_some_and(|entries| entries.remove(key).is_some()))
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<String>> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn contains(&self, namespace: &str, key: &str) -> Result<bool> {
        let namespaces = self.namespaces.read().await;
        Ok(namespaces
            .get(namespace)
            .is_some_and(|entries| entries.contains_key(key)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

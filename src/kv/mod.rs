//! Namespaced key-value state store
//!
//! Task records and the dedup cache both live behind [`KvStore`]. Each
//! namespace is an independent key space; there are no transactions beyond
//! what a single `set` provides, so callers that need read-modify-write
//! semantics serialize those updates themselves.
//!
//! ## Backends
//!
//! - [`MemoryKv`] - volatile, process-local map (default)
//! - [`SqliteKv`] - SQLite file, survives restarts

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::StateBackend;
use crate::error::Result;

mod memory;
mod sqlite;

pub use memory::MemoryKv;
pub use sqlite::SqliteKv;

/// Namespace holding serialized task records, keyed by task id
pub const TASK_NAMESPACE: &str = "task";

/// Namespace holding dedup markers, keyed by `{store_id}_{file_name}`
pub const DEDUP_NAMESPACE: &str = "dedup";

/// A namespaced map of byte values
///
/// Implementations synchronize internally and are shared by every worker
/// pool without external locking.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value, `None` if the key is absent
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or replace a value
    async fn set(&self, namespace: &str, key: &str, value: &[u8]) -> Result<()>;

    /// Remove a value, returning whether it existed
    async fn delete(&self, namespace: &str, key: &str) -> Result<bool>;

    /// All keys in a namespace, in unspecified order
    async fn keys(&self, namespace: &str) -> Result<Vec<String>>;

    /// Whether a key is present
    async fn contains(&self, namespace: &str, key: &str) -> Result<bool> {
        Ok(self.get(namespace, key).await?.is_some())
    }

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Open the backend selected by configuration
pub async fn open(backend: &StateBackend) -> Result<Arc<dyn KvStore>> {
    let kv: Arc<dyn KvStore> = match backend {
        StateBackend::Memory => Arc::new(MemoryKv::new()),
        StateBackend::Sqlite { path } => Arc::new(SqliteKv::open(path).await?),
    };

    tracing::info!(backend = kv.name(), "State store opened");
    Ok(kv)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

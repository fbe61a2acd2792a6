//! Advisory per-destination existence cache
//!
//! Records which files have already been delivered to which destination so
//! that a second run, or a concurrent task targeting the same destination,
//! does not deliver them again. The cache is advisory: a miss always falls
//! through to the destination's own write path, and lookup errors are
//! treated as misses.

use std::sync::Arc;

use crate::error::Result;
use crate::kv::{DEDUP_NAMESPACE, KvStore};

/// Existence cache keyed by `(destination identity, filename)`
#[derive(Clone)]
pub struct DedupCache {
    kv: Arc<dyn KvStore>,
}

impl DedupCache {
    /// Create a cache over the shared state store
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Cache key for a file at a destination
    pub fn key(store_id: &str, file_name: &str) -> String {
        format!("{}_{}", store_id, file_name)
    }

    /// Whether `file_name` is known to exist at `store_id`
    pub async fn exists(&self, store_id: &str, file_name: &str) -> bool {
        let key = Self::key(store_id, file_name);
        match self.kv.contains(DEDUP_NAMESPACE, &key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Dedup lookup failed, treating as miss");
                false
            }
        }
    }

    /// Record that `file_name` now exists at `store_id`; `marker` is stored as the value
    pub async fn mark(&self, store_id: &str, file_name: &str, marker: &str) -> Result<()> {
        let key = Self::key(store_id, file_name);
        self.kv
            .set(DEDUP_NAMESPACE, &key, marker.as_bytes())
            .await
    }
}

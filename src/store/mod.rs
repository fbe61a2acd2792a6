//! Destination store contract and descriptor resolution
//!
//! A [`Destination`] descriptor is resolved exactly once, when a job is
//! submitted, into an `Arc<dyn Store>` handle. The pipeline only ever talks
//! to the handle; it never inspects which kind of destination it is.
//!
//! Destinations that need an external client (forwarding into a chat)
//! receive it as an explicit capability at resolver construction. A chat
//! integration implements both [`Source`](crate::Source) and
//! [`MessageForwarder`] over one client and hands the same `Arc` to both.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::types::{Destination, Item};

mod file;
mod forward;

pub use file::FileStore;
pub use forward::ForwardStore;

/// Trait for destination stores
#[async_trait]
pub trait Store: Send + Sync {
    /// Persist one item, returning the path or reference it was written to
    ///
    /// `item.dst` carries the path from [`item_dst_path`](Store::item_dst_path).
    async fn write(&self, item: &Item) -> Result<String>;

    /// Whether the item is already present
    ///
    /// Best-effort: may be bound by filesystem or API latency.
    async fn item_exists(&self, item: &Item) -> bool;

    /// Canonical location the item is written under
    fn item_dst_path(&self, item: &Item) -> String;

    /// Create a directory (or equivalent) at `path`
    async fn create_dir(&self, path: &str) -> Result<()>;

    /// Remove everything under `path`
    async fn clean_all(&self, path: &str) -> Result<()>;

    /// Stable identity, used to partition the dedup cache
    fn id(&self) -> &str;
}

/// Capability for forwarding a message from a source chat into another chat
#[async_trait]
pub trait MessageForwarder: Send + Sync {
    /// Forward `message_id` from `from_account` into `to_chat`
    async fn forward(&self, from_account: &str, to_chat: i64, message_id: &str) -> Result<()>;
}

/// Maps destination descriptors to store handles
#[derive(Clone, Default)]
pub struct StoreResolver {
    forwarder: Option<Arc<dyn MessageForwarder>>,
}

impl StoreResolver {
    /// A resolver that supports file destinations only
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable `Forward` destinations using the given capability
    pub fn with_forwarder(mut self, forwarder: Arc<dyn MessageForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    /// Resolve a descriptor into a store handle
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDestination`] when the descriptor needs a
    /// capability this resolver was not given, or the store cannot be
    /// initialized.
    pub async fn resolve(&self, destination: &Destination) -> Result<Arc<dyn Store>> {
        match destination {
            Destination::File {
                base_path,
                clean_on_start,
            } => {
                let store = FileStore::new(base_path, *clean_on_start)
                    .await
                    .map_err(|e| Error::UnknownDestination(format!("{destination}: {e}")))?;
                Ok(Arc::new(store))
            }
            Destination::Forward { chat_id } => {
                let forwarder = self.forwarder.clone().ok_or_else(|| {
                    Error::UnknownDestination(format!(
                        "{destination}: no message forwarder configured"
                    ))
                })?;
                Ok(Arc::new(ForwardStore::new(*chat_id, forwarder)))
            }
        }
    }
}

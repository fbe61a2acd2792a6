//! Chat destination: items are forwarded by reference, never as bytes.

use async_trait::async_trait;
use std::sync::Arc;

use super::{MessageForwarder, Store};
use crate::error::{Error, Result};
use crate::types::Item;

/// Forwards each item from its source chat into a target chat
pub struct ForwardStore {
    chat_id: i64,
    id: String,
    forwarder: Arc<dyn MessageForwarder>,
}

impl ForwardStore {
    /// Create a store forwarding into `chat_id`
    pub fn new(chat_id: i64, forwarder: Arc<dyn MessageForwarder>) -> Self {
        Self {
            chat_id,
            id: chat_id.to_string(),
            forwarder,
        }
    }
}

#[async_trait]
impl Store for ForwardStore {
    async fn write(&self, item: &Item) -> Result<String> {
        self.forwarder
            .forward(&item.source_account, self.chat_id, &item.id)
            .await
            .map_err(|e| Error::StoreWriteFailed {
                store: self.id.clone(),
                file_name: item.file_name.clone(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            from = %item.source_account,
            to = self.chat_id,
            msg = %item.file_name,
            "Forwarded message"
        );
        Ok(self.id.clone())
    }

    async fn item_exists(&self, _item: &Item) -> bool {
        // A chat cannot be queried cheaply; rely on the dedup cache instead
        false
    }

    fn item_dst_path(&self, _item: &Item) -> String {
        self.id.clone()
    }

    async fn create_dir(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn clean_all(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

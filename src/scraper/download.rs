//! Download workers, one pool per media kind.
//!
//! For each job the worker fetches the payload once, then attempts every
//! remaining destination in order. A destination whose dedup marker is
//! already set is skipped; a failed write is logged and the remaining
//! destinations are still attempted. The item is accounted for exactly
//! once, whatever happened.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Event, Item, ItemOutcome, MediaKind, TaskId};

use super::Scraper;
use super::queue::{DownloadJob, WorkQueue};

impl Scraper {
    /// Download worker loop
    pub(crate) async fn run_download_worker(
        self,
        kind: MediaKind,
        worker: usize,
        queue: WorkQueue<DownloadJob>,
    ) {
        while let Some(job) = queue.recv().await {
            self.process_download(job).await;
        }
        tracing::debug!(%kind, worker, "Download worker stopped");
    }

    pub(super) async fn process_download(&self, job: DownloadJob) {
        let DownloadJob {
            task_id,
            mut item,
            stores,
        } = job;

        let outcome = match self.fetch_item(&mut item).await {
            Ok(()) => {
                let written = self.deliver(task_id, &mut item, &stores).await;
                ItemOutcome::Processed { written }
            }
            Err(e) => {
                tracing::warn!(
                    task_id = %task_id,
                    item_id = %item.id,
                    link = %item.link,
                    error = %e,
                    "Dropping item"
                );
                self.emit_event(Event::ItemFailed {
                    id: task_id,
                    item_id: item.id.clone(),
                    error: e.to_string(),
                });
                ItemOutcome::Failed
            }
        };

        self.account_for(task_id, &item.id, outcome).await;
    }

    /// Materialize the payload, bounded by the item's timeout
    async fn fetch_item(&self, item: &mut Item) -> Result<()> {
        let fetched = match item.timeout {
            Some(limit) => {
                match tokio::time::timeout(limit, self.source.download_item(item)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(limit)),
                }
            }
            None => self.source.download_item(item).await,
        };

        fetched.map_err(|e| Error::DownloadFailed {
            item_id: item.id.clone(),
            reason: e.to_string(),
        })
    }

    /// Write the item to every store that does not have it yet; returns the
    /// number of successful writes
    async fn deliver(&self, task_id: TaskId, item: &mut Item, stores: &[Arc<dyn Store>]) -> u64 {
        let mut written = 0;

        for store in stores {
            if self.dedup.exists(store.id(), &item.file_name).await {
                tracing::debug!(
                    task_id = %task_id,
                    store = store.id(),
                    file = %item.file_name,
                    "Already delivered, skipping destination"
                );
                continue;
            }

            item.dst = Some(store.item_dst_path(item));
            match store.write(item).await {
                Ok(path) => {
                    written += 1;
                    if let Err(e) = self.dedup.mark(store.id(), &item.file_name, &item.id).await {
                        tracing::warn!(store = store.id(), file = %item.file_name, error = %e, "Failed to record dedup marker");
                    }
                    if let Some(dst) = item.dst.as_deref()
                        && let Err(e) = self.record_delivery(task_id, &item.id, dst).await
                    {
                        tracing::warn!(task_id = %task_id, item_id = %item.id, error = %e, "Failed to record destination");
                    }
                    tracing::debug!(task_id = %task_id, store = store.id(), path = %path, "Item delivered");
                    self.emit_event(Event::ItemDelivered {
                        id: task_id,
                        item_id: item.id.clone(),
                        store: store.id().to_string(),
                        path,
                    });
                }
                Err(e) => {
                    let error = match e {
                        e @ Error::StoreWriteFailed { .. } => e,
                        other => Error::StoreWriteFailed {
                            store: store.id().to_string(),
                            file_name: item.file_name.clone(),
                            reason: other.to_string(),
                        },
                    };
                    tracing::warn!(task_id = %task_id, item_id = %item.id, store = store.id(), error = %error, "Write failed");
                    self.emit_event(Event::ItemFailed {
                        id: task_id,
                        item_id: item.id.clone(),
                        error: error.to_string(),
                    });
                }
            }
        }

        written
    }
}

//! Pool startup and shutdown coordination.
//!
//! Queue closure cascades down the pipeline. Shutdown drops the only
//! sender of the discovery queue; each discovery worker then finishes its
//! in-flight drains and exits, and with the last one gone every handle to
//! the download queues is dropped, so the download workers drain what is
//! left and exit too. No download queue closes while a discovery worker is
//! still running.

use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::{Event, MediaKind};

use super::Scraper;
use super::queue::{DiscoveryJob, DownloadJob, DownloadQueues, WorkQueue};

/// Upper bound on how long shutdown waits for in-flight work
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl Scraper {
    /// Spawn the download pools, the discovery pool and the discovery supervisor
    pub(crate) fn spawn_pools(&self, discovery_rx: mpsc::Receiver<DiscoveryJob>) {
        let workers = &self.config.workers;
        let tracker = &self.pipeline.tracker;

        let downloads = DownloadQueues {
            image: self.spawn_download_pool(MediaKind::Image, workers.image_workers),
            video: self.spawn_download_pool(MediaKind::Video, workers.video_workers),
            message: self.spawn_download_pool(MediaKind::Message, workers.message_workers),
        };

        let queue = WorkQueue::new(discovery_rx);
        let discovery_workers: Vec<_> = (0..workers.topic_workers)
            .map(|worker| {
                tracker.spawn(self.clone().run_discovery_worker(
                    worker,
                    queue.clone(),
                    downloads.clone(),
                ))
            })
            .collect();
        // The discovery workers now hold the only download queue senders
        drop(downloads);

        tracker.spawn(async move {
            for handle in discovery_workers {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "Discovery worker panicked");
                }
            }
            tracing::info!("Discovery pool stopped, download queues closed");
        });
    }

    fn spawn_download_pool(&self, kind: MediaKind, size: usize) -> mpsc::Sender<DownloadJob> {
        let (tx, rx) = mpsc::channel(self.config.workers.download_queue_capacity);
        let queue = WorkQueue::new(rx);

        for worker in 0..size {
            self.pipeline
                .tracker
                .spawn(self.clone().run_download_worker(kind, worker, queue.clone()));
        }
        tracing::debug!(%kind, workers = size, "Download pool started");

        tx
    }

    /// Gracefully shut down the scraper
    ///
    /// This method performs a graceful shutdown sequence:
    /// 1. Stops accepting new jobs (`submit_job` returns `ShuttingDown`)
    /// 2. Closes the discovery queue
    /// 3. Waits for every discovery worker and its drains, then for every
    ///    download worker to drain its queue (bounded by a 30 second timeout)
    /// 4. Emits [`Event::Shutdown`]
    ///
    /// Calling it again is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.pipeline.accepting_new.store(false, Ordering::SeqCst);
        tracing::info!("Stopped accepting new jobs");

        drop(self.pipeline.discovery_tx.lock().await.take());
        self.pipeline.tracker.close();

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.pipeline.tracker.wait()).await {
            Ok(()) => tracing::info!("All worker pools stopped"),
            Err(_) => tracing::warn!(
                remaining = self.pipeline.tracker.len(),
                "Timeout waiting for worker pools, proceeding with shutdown"
            ),
        }

        self.emit_event(Event::Shutdown);

        tracing::info!("Graceful shutdown complete");
        Ok(())
    }

    /// Whether new jobs are being accepted
    pub fn is_accepting(&self) -> bool {
        self.pipeline.accepting_new.load(Ordering::SeqCst)
    }
}

//! Work queues connecting the pools.
//!
//! Every queue is a bounded mpsc channel. A pool of N workers shares one
//! receiver, so each job is handed to exactly one worker and producers
//! suspend while the queue is full.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};

use crate::store::Store;
use crate::types::{Item, Job, MediaKind, TaskId};

use super::discovery::PostPolicy;

/// Receiver shared by every worker of one pool
pub(crate) struct WorkQueue<T> {
    rx: Arc<Mutex<mpsc::Receiver<T>>>,
}

impl<T> Clone for WorkQueue<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> WorkQueue<T> {
    pub(crate) fn new(rx: mpsc::Receiver<T>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Next job, or `None` once every sender is gone and the queue is drained
    pub(crate) async fn recv(&self) -> Option<T> {
        self.rx.lock().await.recv().await
    }
}

/// A submitted job waiting for a discovery worker
pub(crate) struct DiscoveryJob {
    pub(crate) task_id: TaskId,
    pub(crate) job: Job,
    /// Filters compiled at submission
    pub(crate) policy: Arc<PostPolicy>,
    /// Store handles resolved at submission, in destination order
    pub(crate) stores: Arc<[Arc<dyn Store>]>,
    /// Bound on each download attempt for this task's items
    pub(crate) item_timeout: Option<Duration>,
}

/// A discovered item waiting for a download worker
pub(crate) struct DownloadJob {
    pub(crate) task_id: TaskId,
    pub(crate) item: Item,
    /// Destinations that do not have the item yet
    pub(crate) stores: Vec<Arc<dyn Store>>,
}

/// Sender side of the per-kind download queues
///
/// Discovery workers hold the only clones; the queues close once the last
/// discovery worker and all of its drains are gone.
#[derive(Clone)]
pub(crate) struct DownloadQueues {
    pub(crate) image: mpsc::Sender<DownloadJob>,
    pub(crate) video: mpsc::Sender<DownloadJob>,
    pub(crate) message: mpsc::Sender<DownloadJob>,
}

impl DownloadQueues {
    /// Push a job onto the queue for its item's kind, suspending while it is full
    ///
    /// Hands the job back if the queue's workers are gone.
    pub(crate) async fn route(&self, job: DownloadJob) -> Result<(), DownloadJob> {
        let queue = match job.item.kind {
            MediaKind::Image => &self.image,
            MediaKind::Video => &self.video,
            MediaKind::Message => &self.message,
        };
        queue.send(job).await.map_err(|e| e.0)
    }
}

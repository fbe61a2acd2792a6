//! Task orchestration split into focused submodules.
//!
//! The `Scraper` struct and its methods are organized by stage:
//! - [`queue`] - Work queues connecting the pools
//! - [`submit`] - Job validation and task creation
//! - [`state`] - Task record reads and serialized updates
//! - [`wait`] - Blocking on task completion
//! - [`discovery`] - Discovery workers draining source streams
//! - [`download`] - Per-kind download workers
//! - [`lifecycle`] - Pool startup and shutdown coordination

mod discovery;
mod download;
mod lifecycle;
mod queue;
mod state;
mod submit;
mod wait;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tokio::sync::{Mutex, broadcast, mpsc};
use tokio_util::task::TaskTracker;

use crate::config::Config;
use crate::dedup::DedupCache;
use crate::error::Result;
use crate::kv::{self, KvStore};
use crate::source::Source;
use crate::store::StoreResolver;
use crate::types::Event;

use queue::DiscoveryJob;

/// Handles to the running worker pools
#[derive(Clone)]
pub(crate) struct Pipeline {
    /// Sender side of the discovery queue; taken on shutdown to close it
    pub(crate) discovery_tx: Arc<Mutex<Option<mpsc::Sender<DiscoveryJob>>>>,
    /// Every worker and the discovery supervisor
    pub(crate) tracker: TaskTracker,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
}

/// Main scraper instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Scraper {
    /// Configuration with worker counts normalized
    pub(crate) config: Arc<Config>,
    /// Task records and dedup markers
    pub(crate) kv: Arc<dyn KvStore>,
    /// Per-destination existence cache
    pub(crate) dedup: DedupCache,
    /// Content source adapter
    pub(crate) source: Arc<dyn Source>,
    /// Destination descriptor resolution
    pub(crate) resolver: StoreResolver,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Serializes read-modify-write updates of task records
    pub(crate) task_lock: Arc<Mutex<()>>,
    /// Worker pool handles
    pub(crate) pipeline: Pipeline,
}

impl Scraper {
    /// Create a new Scraper instance
    ///
    /// Opens the configured state backend and spawns the discovery pool and
    /// one download pool per media kind. Must be called from within a Tokio
    /// runtime.
    pub async fn new(
        config: Config,
        source: Arc<dyn Source>,
        resolver: StoreResolver,
    ) -> Result<Self> {
        let kv = kv::open(&config.persistence.state_backend).await?;
        Ok(Self::with_state_store(config, kv, source, resolver))
    }

    /// Create a Scraper over an already opened state store
    ///
    /// Several scrapers may share one store; the dedup cache then spans all
    /// of them.
    pub fn with_state_store(
        mut config: Config,
        kv: Arc<dyn KvStore>,
        source: Arc<dyn Source>,
        resolver: StoreResolver,
    ) -> Self {
        config.workers = config.workers.normalized();

        let (event_tx, _rx) = broadcast::channel(1000);
        let (discovery_tx, discovery_rx) =
            mpsc::channel(config.workers.discovery_queue_capacity);

        let scraper = Self {
            config: Arc::new(config),
            dedup: DedupCache::new(kv.clone()),
            kv,
            source,
            resolver,
            event_tx,
            task_lock: Arc::new(Mutex::new(())),
            pipeline: Pipeline {
                discovery_tx: Arc::new(Mutex::new(Some(discovery_tx))),
                tracker: TaskTracker::new(),
                accepting_new: Arc::new(AtomicBool::new(true)),
            },
        };

        scraper.spawn_pools(discovery_rx);

        tracing::info!(
            source = scraper.source.name(),
            state_store = scraper.kv.name(),
            topic_workers = scraper.config.workers.topic_workers,
            image_workers = scraper.config.workers.image_workers,
            video_workers = scraper.config.workers.video_workers,
            message_workers = scraper.config.workers.message_workers,
            "Scraper started"
        );

        scraper
    }

    /// Subscribe to task events
    ///
    /// Each subscriber receives all events independently. A subscriber that
    /// falls behind by more than 1000 events receives `RecvError::Lagged`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use content_pirate::{Config, Scraper, Source, StoreResolver};
    ///
    /// # async fn example(source: Arc<dyn Source>) -> Result<(), Box<dyn std::error::Error>> {
    /// let scraper = Scraper::new(Config::default(), source, StoreResolver::new()).await?;
    ///
    /// let mut events = scraper.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         tracing::info!(?event, "scrape event");
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}

//! Job validation and task creation.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Event, Job, Task, TaskId, TaskStatus};

use super::Scraper;
use super::discovery::PostPolicy;
use super::queue::DiscoveryJob;

impl Scraper {
    /// Submit a scrape job
    ///
    /// Validates the job, resolves every destination into a store handle,
    /// persists a new task in the `Created` phase and enqueues the source
    /// account for discovery. Suspends while the discovery queue is full.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownDestination`] if a destination cannot be resolved
    /// - [`Error::Config`] if the job has no destinations or a title filter
    ///   does not compile
    /// - [`Error::ShuttingDown`] once [`shutdown`](Self::shutdown) has begun
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::sync::Arc;
    /// use std::time::Duration;
    /// use content_pirate::{Config, Destination, Job, Scraper, Source, StoreResolver};
    ///
    /// # async fn example(source: Arc<dyn Source>) -> Result<(), Box<dyn std::error::Error>> {
    /// let scraper = Scraper::new(Config::default(), source, StoreResolver::new()).await?;
    ///
    /// let mut job = Job::new(
    ///     "pics",
    ///     vec![Destination::File { base_path: "./download".into(), clean_on_start: false }],
    /// );
    /// job.options.limit = 3;
    ///
    /// let id = scraper.submit_job(job).await?;
    /// if scraper.wait_on_task(id, Duration::from_secs(60)).await? {
    ///     let status = scraper.check_status(id).await?;
    ///     println!("{} of {} items done", status.items_done, status.total_items);
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_job(&self, job: Job) -> Result<TaskId> {
        if !self.pipeline.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        if job.destinations.is_empty() {
            return Err(Error::Config {
                message: "job has no destinations".to_string(),
                key: Some("destinations".to_string()),
            });
        }
        let policy = PostPolicy::compile(&job.options)?;

        let mut stores: Vec<Arc<dyn Store>> = Vec::with_capacity(job.destinations.len());
        for destination in &job.destinations {
            stores.push(self.resolver.resolve(destination).await?);
        }

        let discovery_tx = self
            .pipeline
            .discovery_tx
            .lock()
            .await
            .clone()
            .ok_or(Error::ShuttingDown)?;

        let now = Utc::now();
        let task = Task {
            id: TaskId::new(),
            job: job.clone(),
            items: Vec::new(),
            status: TaskStatus::default(),
            store_ids: stores.iter().map(|s| s.id().to_string()).collect(),
            created_at: now,
            updated_at: now,
        };
        let id = task.id;
        self.save_task(&task).await?;

        self.emit_event(Event::TaskCreated {
            id,
            source_account: job.source_account.clone(),
        });
        tracing::info!(
            task_id = %id,
            account = %job.source_account,
            destinations = stores.len(),
            "Job submitted"
        );

        let item_timeout = job.item_timeout.or(self.config.download.item_timeout);
        let discovery = DiscoveryJob {
            task_id: id,
            job,
            policy: Arc::new(policy),
            stores: stores.into(),
            item_timeout,
        };

        if discovery_tx.send(discovery).await.is_err() {
            // Every discovery worker is gone; the task could never progress
            if let Err(e) = self.remove_task(id).await {
                tracing::warn!(task_id = %id, error = %e, "Failed to remove orphaned task");
            }
            return Err(Error::ShuttingDown);
        }

        Ok(id)
    }
}

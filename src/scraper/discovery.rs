//! Discovery workers: turn source-account identifiers into routed items.
//!
//! A worker pulls one [`DiscoveryJob`] at a time, asks the source for the
//! account's post stream and drains that stream on its own task, so a slow
//! or endless source never blocks the worker from picking up the next job.
//! When the discovery queue closes, the worker waits for its in-flight
//! drains and exits, dropping its handles to the download queues.

use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::{FutureExt, StreamExt};
use regex::Regex;
use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::source::PostStream;
use crate::store::Store;
use crate::types::{
    CollectionPolicy, Event, Item, ItemOutcome, MediaKind, Post, ScrapeOptions, TaskId,
};
use crate::utils::{resolve_extension, resolve_file_name};

use super::Scraper;
use super::queue::{DiscoveryJob, DownloadJob, DownloadQueues, WorkQueue};

/// Posts dropped before they become items, compiled from [`ScrapeOptions`]
#[derive(Debug)]
pub(crate) struct PostPolicy {
    skip_videos: bool,
    collection: CollectionPolicy,
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl PostPolicy {
    /// Compile the title filters
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first pattern that does not compile.
    pub(crate) fn compile(options: &ScrapeOptions) -> Result<Self> {
        Ok(Self {
            skip_videos: options.skip_videos,
            collection: options.collection,
            include: compile_patterns(&options.filter.include, "filter.include")?,
            exclude: compile_patterns(&options.filter.exclude, "filter.exclude")?,
        })
    }

    /// Whether a post should become an item
    ///
    /// `seen` holds the post ids already admitted by the current drain.
    pub(crate) fn admits(&self, post: &Post, seen: &mut HashSet<String>) -> bool {
        if self.skip_videos && post.kind == MediaKind::Video {
            return false;
        }
        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(&post.title)) {
            return false;
        }
        if self.exclude.iter().any(|re| re.is_match(&post.title)) {
            return false;
        }

        // Entries of one collection share the post id
        let first = seen.insert(post.id.clone());
        first || self.collection == CollectionPolicy::All
    }
}

fn compile_patterns(patterns: &[String], key: &str) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|e| Error::Config {
                message: format!("invalid pattern '{}': {}", pattern, e),
                key: Some(key.to_string()),
            })
        })
        .collect()
}

/// Build the item a post is tracked and delivered as
pub(crate) fn build_item(post: Post, timeout: Option<Duration>) -> Item {
    let ext = resolve_extension(&post);
    let file_name = resolve_file_name(&post, &ext);

    Item {
        id: post.id,
        link: post.link,
        title: post.title,
        file_name,
        kind: post.kind,
        ext,
        source_account: post.source_account,
        dst: None,
        timeout,
        data: None,
    }
}

/// Stores that do not report the item as present
pub(crate) async fn filter_stores(stores: &[Arc<dyn Store>], item: &Item) -> Vec<Arc<dyn Store>> {
    let mut remaining = Vec::with_capacity(stores.len());
    for store in stores {
        if store.item_exists(item).await {
            tracing::debug!(store = store.id(), file = %item.file_name, "Item already present");
        } else {
            remaining.push(Arc::clone(store));
        }
    }
    remaining
}

impl Scraper {
    /// Discovery worker loop
    pub(crate) async fn run_discovery_worker(
        self,
        worker: usize,
        queue: WorkQueue<DiscoveryJob>,
        downloads: DownloadQueues,
    ) {
        let mut drains = JoinSet::new();

        while let Some(job) = queue.recv().await {
            while let Some(result) = drains.try_join_next() {
                log_drain_result(worker, result);
            }

            let task_id = job.task_id;
            let account = job.job.source_account.clone();
            tracing::debug!(worker, task_id = %task_id, account = %account, "Scraping account");

            match self.source.scrape_posts(&account, &job.job.options).await {
                Ok(stream) => {
                    drains.spawn(self.clone().guarded_drain(job, stream, downloads.clone()));
                }
                Err(e) => {
                    self.discovery_failed(&job, e).await;
                }
            }
        }

        while let Some(result) = drains.join_next().await {
            log_drain_result(worker, result);
        }
        tracing::debug!(worker, "Discovery worker stopped");
    }

    /// Run a drain; a panicking source stream still finishes discovery
    async fn guarded_drain(self, job: DiscoveryJob, stream: PostStream, downloads: DownloadQueues) {
        let task_id = job.task_id;
        let drain = AssertUnwindSafe(self.clone().drain_posts(job, stream, downloads));

        if drain.catch_unwind().await.is_err() {
            tracing::error!(task_id = %task_id, "Discovery drain panicked, closing discovery");
            if let Err(e) = self.finish_discovery(task_id).await {
                tracing::error!(task_id = %task_id, error = %e, "Failed to finish discovery");
            }
        }
    }

    /// Drain one account's post stream into the task
    async fn drain_posts(self, job: DiscoveryJob, mut stream: PostStream, downloads: DownloadQueues) {
        let task_id = job.task_id;
        let mut seen = HashSet::new();

        while let Some(post) = stream.next().await {
            if !job.policy.admits(&post, &mut seen) {
                tracing::trace!(task_id = %task_id, post_id = %post.id, "Post dropped by policy");
                continue;
            }

            let item = build_item(post, job.item_timeout);
            if let Err(e) = self.append_item(task_id, item.clone()).await {
                tracing::error!(task_id = %task_id, item_id = %item.id, error = %e, "Failed to record discovered item");
                continue;
            }

            let stores = filter_stores(&job.stores, &item).await;
            if stores.is_empty() {
                self.emit_event(Event::ItemSkipped {
                    id: task_id,
                    item_id: item.id.clone(),
                });
                self.account_for(task_id, &item.id, ItemOutcome::Skipped).await;
                continue;
            }

            let item_id = item.id.clone();
            let download = DownloadJob {
                task_id,
                item,
                stores,
            };
            if downloads.route(download).await.is_err() {
                tracing::error!(task_id = %task_id, item_id = %item_id, "Download queue closed, dropping item");
                self.account_for(task_id, &item_id, ItemOutcome::Failed).await;
            }
        }

        if let Err(e) = self.finish_discovery(task_id).await {
            tracing::error!(task_id = %task_id, error = %e, "Failed to finish discovery");
        }
    }

    async fn discovery_failed(&self, job: &DiscoveryJob, cause: Error) {
        let error = Error::SourceScrapeFailed {
            account: job.job.source_account.clone(),
            reason: cause.to_string(),
        };
        tracing::warn!(
            task_id = %job.task_id,
            source = self.source.name(),
            error = %error,
            "Source failed, abandoning account"
        );
        self.emit_event(Event::DiscoveryFailed {
            id: job.task_id,
            source_account: job.job.source_account.clone(),
            error: error.to_string(),
        });

        if let Err(e) = self.finish_discovery(job.task_id).await {
            tracing::error!(task_id = %job.task_id, error = %e, "Failed to finish discovery");
        }
    }

    /// `increment_done` for callers that can only log its failure
    pub(crate) async fn account_for(&self, task_id: TaskId, item_id: &str, outcome: ItemOutcome) {
        if let Err(e) = self.increment_done(task_id, outcome).await {
            tracing::error!(task_id = %task_id, item_id, error = %e, "Failed to update task status");
        }
    }
}

fn log_drain_result(worker: usize, result: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::error!(worker, error = %e, "Discovery drain panicked");
    }
}

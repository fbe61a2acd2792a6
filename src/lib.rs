//! # content-pirate
//!
//! Orchestration core for scraping content from external sources into one
//! or more destination stores.
//!
//! A caller submits a [`Job`] (a source account, a list of destinations and
//! scrape options). The [`Scraper`] records it as a [`Task`], discovers the
//! account's posts through a [`Source`] adapter, routes every discovered
//! item to a download pool for its media kind and writes it to each
//! destination [`Store`] that does not have it yet. Progress is durable in
//! a key-value state store and can be polled, awaited or observed through
//! [`Event`]s.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Adapters at the edges** - Sources and stores are traits; the core
//!   never knows which service it talks to
//! - **Completion means accounted for** - A task completes once every
//!   discovered item was delivered, skipped or dropped; failures are
//!   logged and counted, never fatal
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use content_pirate::{Config, Destination, Job, Scraper, Source, StoreResolver};
//!
//! # async fn example(source: Arc<dyn Source>) -> Result<(), Box<dyn std::error::Error>> {
//! let scraper = Scraper::new(Config::default(), source, StoreResolver::new()).await?;
//!
//! let job = Job::new(
//!     "pics",
//!     vec![Destination::File { base_path: "./download".into(), clean_on_start: false }],
//! );
//! let id = scraper.submit_job(job).await?;
//!
//! if scraper.wait_on_task(id, Duration::from_secs(300)).await? {
//!     println!("{:?}", scraper.check_status(id).await?);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Advisory per-destination existence cache
pub mod dedup;
/// Error types
pub mod error;
/// Namespaced key-value state store
pub mod kv;
/// Retry logic with exponential backoff
pub mod retry;
/// Task orchestration (decomposed into focused submodules)
pub mod scraper;
/// Source adapter contract
pub mod source;
/// Destination stores
pub mod store;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use config::{Config, StateBackend};
pub use dedup::DedupCache;
pub use error::{DatabaseError, Error, Result};
pub use kv::{KvStore, MemoryKv, SqliteKv};
pub use scraper::Scraper;
pub use source::{PostStream, Source};
pub use store::{FileStore, ForwardStore, MessageForwarder, Store, StoreResolver};
pub use types::{
    CollectionPolicy, ContentFilter, Destination, Event, Item, ItemOutcome, Job, MediaKind,
    Phase, Post, ScrapeOptions, SortOrder, Task, TaskId, TaskStatus, TimeWindow,
};

/// Helper function to run the scraper with graceful signal handling.
///
/// Waits for a termination signal and then calls the scraper's `shutdown()` method.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use content_pirate::{Config, Scraper, Source, StoreResolver, run_with_shutdown};
///
/// # async fn example(source: Arc<dyn Source>) -> Result<(), Box<dyn std::error::Error>> {
/// let scraper = Scraper::new(Config::default(), source, StoreResolver::new()).await?;
///
/// // Submit jobs from another task, then block until a signal arrives
/// run_with_shutdown(scraper).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_with_shutdown(scraper: Scraper) -> Result<()> {
    wait_for_signal().await;
    scraper.shutdown().await
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, stopping scraper"),
                _ = sigint.recv() => tracing::info!("Received SIGINT, stopping scraper"),
            }
        }
        // Registration can fail in restricted environments (containers, tests)
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, waiting for Ctrl+C");
            wait_for_ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    wait_for_ctrl_c().await;
}

async fn wait_for_ctrl_c() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, stopping scraper"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}

//! Source adapter contract
//!
//! A source turns a source-account identifier (a subreddit, a chat id) into
//! a lazy sequence of [`Post`]s and later materializes each item's payload.
//! Concrete integrations live outside this crate; the orchestration core
//! only consumes this trait.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::types::{Item, Post, ScrapeOptions};

/// Lazy sequence of discovered posts
pub type PostStream = BoxStream<'static, Post>;

/// Trait for content sources
///
/// Errors from either method are non-fatal to the pipeline: a failed
/// `scrape_posts` abandons that identifier, a failed `download_item` drops
/// that item. Sources that hit rate limits are expected to back off and
/// retry internally (see [`retry_with_backoff`](crate::retry::retry_with_backoff))
/// rather than surface [`Error::RateLimited`](crate::Error::RateLimited).
#[async_trait]
pub trait Source: Send + Sync {
    /// Enumerate posts for an account
    ///
    /// The returned stream is drained on its own task, so it must be
    /// `'static` and may keep producing after this call returns.
    async fn scrape_posts(&self, account: &str, options: &ScrapeOptions) -> Result<PostStream>;

    /// Fill `item.data` with the item's payload
    ///
    /// Items that are delivered by reference (forwarded messages) may leave
    /// `data` empty.
    async fn download_item(&self, item: &mut Item) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

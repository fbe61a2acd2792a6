//! Scripted source adapter and post builders

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use content_pirate::config::Config;
use content_pirate::{
    Error, Item, MediaKind, Post, PostStream, Result, ScrapeOptions, Scraper, Source,
    StoreResolver,
};

/// Source serving a fixed listing per account
#[derive(Default)]
pub struct ListingSource {
    listings: HashMap<String, Vec<Post>>,
    downloads: AtomicUsize,
}

impl ListingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, account: &str, posts: Vec<Post>) -> Self {
        self.listings.insert(account.to_string(), posts);
        self
    }

    /// Payloads fetched so far
    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for ListingSource {
    async fn scrape_posts(&self, account: &str, options: &ScrapeOptions) -> Result<PostStream> {
        let posts = self
            .listings
            .get(account)
            .ok_or_else(|| Error::Other(format!("no such account: {}", account)))?;
        let page: Vec<Post> = posts.iter().take(options.limit).cloned().collect();
        Ok(futures::stream::iter(page).boxed())
    }

    async fn download_item(&self, item: &mut Item) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        item.data = Some(format!("{} <{}>", item.title, item.link).into_bytes());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "listing"
    }
}

/// `count` image posts titled "picture N" with ids `t3_N`
pub fn image_listing(account: &str, count: usize) -> Vec<Post> {
    (0..count)
        .map(|i| Post {
            id: format!("t3_{}", i),
            kind: MediaKind::Image,
            link: format!("https://i.redd.it/{}.jpeg", i),
            title: format!("picture {}", i),
            file_name: None,
            ext: String::new(),
            source_account: account.to_string(),
        })
        .collect()
}

/// Config with small pools and a fast poll interval
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.workers.topic_workers = 2;
    config.workers.image_workers = 3;
    config.download.poll_interval = std::time::Duration::from_millis(25);
    config
}

/// Scraper over `source` with an in-memory state store, plus a scratch directory
pub async fn create_scraper(source: Arc<ListingSource>) -> (Scraper, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let scraper = Scraper::new(test_config(), source, StoreResolver::new())
        .await
        .unwrap();
    (scraper, temp_dir)
}

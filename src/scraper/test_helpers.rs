//! Shared test helpers: scripted sources and stores, and Scraper construction.

use async_trait::async_trait;
use futures::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::Poll;
use std::time::Duration;

use crate::config::{Config, WorkerConfig};
use crate::error::{Error, Result};
use crate::kv::{KvStore, MemoryKv};
use crate::scraper::Scraper;
use crate::source::{PostStream, Source};
use crate::store::{MessageForwarder, Store, StoreResolver};
use crate::types::{Item, MediaKind, Post, ScrapeOptions};

/// Source whose behavior is scripted per account and per item
#[derive(Default)]
pub(crate) struct FakeSource {
    posts: HashMap<String, Vec<Post>>,
    failing_accounts: HashSet<String>,
    hanging_accounts: HashSet<String>,
    crashing_accounts: HashSet<String>,
    failing_items: HashSet<String>,
    hanging_items: HashSet<String>,
    pub(crate) scrape_calls: AtomicUsize,
    pub(crate) downloads: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_posts(mut self, account: &str, posts: Vec<Post>) -> Self {
        self.posts.insert(account.to_string(), posts);
        self
    }

    /// `scrape_posts` fails for this account
    pub(crate) fn failing_account(mut self, account: &str) -> Self {
        self.failing_accounts.insert(account.to_string());
        self
    }

    /// The stream yields the account's posts, then never ends
    pub(crate) fn hanging_account(mut self, account: &str) -> Self {
        self.hanging_accounts.insert(account.to_string());
        self
    }

    /// The stream yields the account's posts, then panics
    pub(crate) fn crashing_account(mut self, account: &str) -> Self {
        self.crashing_accounts.insert(account.to_string());
        self
    }

    /// `download_item` fails for this post id
    pub(crate) fn failing_item(mut self, id: &str) -> Self {
        self.failing_items.insert(id.to_string());
        self
    }

    /// `download_item` never returns for this post id
    pub(crate) fn hanging_item(mut self, id: &str) -> Self {
        self.hanging_items.insert(id.to_string());
        self
    }
}

#[async_trait]
impl Source for FakeSource {
    async fn scrape_posts(&self, account: &str, options: &ScrapeOptions) -> Result<PostStream> {
        self.scrape_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_accounts.contains(account) {
            return Err(Error::Other(format!("listing for {} unavailable", account)));
        }

        let posts: Vec<Post> = self
            .posts
            .get(account)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(options.limit)
            .collect();

        let stream = futures::stream::iter(posts);
        if self.hanging_accounts.contains(account) {
            Ok(stream.chain(futures::stream::pending()).boxed())
        } else if self.crashing_accounts.contains(account) {
            let crash = futures::stream::poll_fn(|_| -> Poll<Option<Post>> {
                panic!("listing parser crashed")
            });
            Ok(stream.chain(crash).boxed())
        } else {
            Ok(stream.boxed())
        }
    }

    async fn download_item(&self, item: &mut Item) -> Result<()> {
        self.downloads.fetch_add(1, Ordering::SeqCst);

        if self.hanging_items.contains(&item.id) {
            futures::future::pending::<()>().await;
        }
        if self.failing_items.contains(&item.id) {
            return Err(Error::Other("404 not found".to_string()));
        }
        if item.kind != MediaKind::Message {
            item.data = Some(format!("payload:{}", item.id).into_bytes());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// In-memory store that records writes
pub(crate) struct RecordingStore {
    id: String,
    present: Mutex<HashSet<String>>,
    fail_writes: bool,
    pub(crate) writes: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub(crate) fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            present: Mutex::new(HashSet::new()),
            fail_writes: false,
            writes: Mutex::new(Vec::new()),
        }
    }

    /// Every write fails
    pub(crate) fn failing(id: &str) -> Self {
        Self {
            fail_writes: true,
            ..Self::new(id)
        }
    }

    pub(crate) fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

#[async_trait]
impl Store for RecordingStore {
    async fn write(&self, item: &Item) -> Result<String> {
        if self.fail_writes {
            return Err(Error::Other("disk full".to_string()));
        }
        let path = format!("{}/{}", self.item_dst_path(item), item.file_name);
        self.writes.lock().unwrap().push(item.file_name.clone());
        self.present.lock().unwrap().insert(item.file_name.clone());
        Ok(path)
    }

    async fn item_exists(&self, item: &Item) -> bool {
        self.present.lock().unwrap().contains(&item.file_name)
    }

    fn item_dst_path(&self, item: &Item) -> String {
        format!("{}/{}", self.id, item.source_account)
    }

    async fn create_dir(&self, _path: &str) -> Result<()> {
        Ok(())
    }

    async fn clean_all(&self, _path: &str) -> Result<()> {
        self.present.lock().unwrap().clear();
        Ok(())
    }

    fn id(&self) -> &str {
        &self.id
    }
}

/// Forwarder that records forwarded messages, optionally failing
#[derive(Default)]
pub(crate) struct RecordingForwarder {
    pub(crate) fail: bool,
    pub(crate) forwarded: Mutex<Vec<(String, i64, String)>>,
}

#[async_trait]
impl MessageForwarder for RecordingForwarder {
    async fn forward(&self, from_account: &str, to_chat: i64, message_id: &str) -> Result<()> {
        if self.fail {
            return Err(Error::Other("chat not writable".to_string()));
        }
        self.forwarded.lock().unwrap().push((
            from_account.to_string(),
            to_chat,
            message_id.to_string(),
        ));
        Ok(())
    }
}

/// Build an image post for `account`
pub(crate) fn image_post(account: &str, id: &str, title: &str) -> Post {
    Post {
        id: id.to_string(),
        kind: MediaKind::Image,
        link: format!("https://i.example.com/{}.png", id),
        title: title.to_string(),
        file_name: None,
        ext: String::new(),
        source_account: account.to_string(),
    }
}

/// Build a post of any kind for `account`
pub(crate) fn post_of_kind(account: &str, id: &str, kind: MediaKind) -> Post {
    Post {
        kind,
        link: format!("https://media.example.com/{}", id),
        ..image_post(account, id, id)
    }
}

/// Small pools and a fast poll interval
pub(crate) fn test_config() -> Config {
    let mut config = Config {
        workers: WorkerConfig {
            topic_workers: 2,
            image_workers: 2,
            video_workers: 1,
            message_workers: 1,
            discovery_queue_capacity: 4,
            download_queue_capacity: 8,
        },
        ..Default::default()
    };
    config.download.poll_interval = Duration::from_millis(20);
    config.download.item_timeout = Some(Duration::from_secs(5));
    config
}

/// Scraper over a fresh in-memory state store
pub(crate) fn create_test_scraper(source: Arc<FakeSource>, resolver: StoreResolver) -> Scraper {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
    Scraper::with_state_store(test_config(), kv, source, resolver)
}

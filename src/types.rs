//! Core types for content-pirate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Unique identifier for a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    /// Create a new random TaskId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner uuid value
    pub fn get(&self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for TaskId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// Kind of media an item carries; selects the download queue it is routed to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video file
    Video,
    /// Chat message, delivered by forwarding rather than by bytes
    Message,
}

impl MediaKind {
    /// Extension used when neither the post nor its link carries one
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Video => "mp4",
            MediaKind::Message => "txt",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Message => "message",
        };
        f.write_str(s)
    }
}

/// Time window a listing is restricted to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    /// Past hour
    Hour,
    /// Past day
    #[default]
    Day,
    /// Past week
    Week,
    /// Past month
    Month,
    /// Past year
    Year,
    /// No restriction
    All,
}

/// Listing order requested from the source
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Highest scored first
    #[default]
    Top,
    /// Currently trending
    Hot,
    /// Most recent first
    New,
}

/// How posts that expand into a collection (e.g. a gallery) are handled
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPolicy {
    /// Keep only the first entry of each collection
    #[default]
    FirstOnly,
    /// Keep every entry of a collection
    All,
}

/// Title filters applied to discovered posts
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentFilter {
    /// Keep a post only if its title matches one of these regexes (empty = keep all)
    #[serde(default)]
    pub include: Vec<String>,
    /// Drop a post whose title matches any of these regexes
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Options passed to the source adapter when enumerating an account
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrapeOptions {
    /// Page size requested from the source (default: 10)
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Page number for sources that paginate by index
    #[serde(default)]
    pub page: u32,
    /// Opaque continuation token for sources that paginate by cursor
    #[serde(default)]
    pub next_page: Option<String>,
    /// Listing time window
    #[serde(default)]
    pub window: TimeWindow,
    /// Only consider posts newer than this instant
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    /// Listing order
    #[serde(default)]
    pub sort: SortOrder,
    /// Drop video posts
    #[serde(default)]
    pub skip_videos: bool,
    /// Collection expansion policy
    #[serde(default)]
    pub collection: CollectionPolicy,
    /// Title filters
    #[serde(default)]
    pub filter: ContentFilter,
}

fn default_limit() -> usize {
    10
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            page: 0,
            next_page: None,
            window: TimeWindow::default(),
            since: None,
            sort: SortOrder::default(),
            skip_videos: false,
            collection: CollectionPolicy::default(),
            filter: ContentFilter::default(),
        }
    }
}

/// Where discovered items should be delivered
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Destination {
    /// A directory on the local filesystem
    File {
        /// Root directory (default: "./download" when empty)
        base_path: PathBuf,
        /// Remove the directory tree before the first write
        #[serde(default)]
        clean_on_start: bool,
    },
    /// A chat that items are forwarded into
    Forward {
        /// Target chat id
        chat_id: i64,
    },
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Destination::File { base_path, .. } => write!(f, "file:{}", base_path.display()),
            Destination::Forward { chat_id } => write!(f, "forward:{}", chat_id),
        }
    }
}

/// A scrape request as submitted by a caller; immutable once submitted
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Source-account identifier (subreddit name, chat id, ...)
    pub source_account: String,
    /// Destinations every discovered item is delivered to
    pub destinations: Vec<Destination>,
    /// Options forwarded to the source adapter
    #[serde(default)]
    pub options: ScrapeOptions,
    /// Per-item download timeout; falls back to the configured default when unset
    #[serde(default, with = "optional_duration_ms")]
    pub item_timeout: Option<Duration>,
}

impl Job {
    /// Create a job with default options
    pub fn new(source_account: impl Into<String>, destinations: Vec<Destination>) -> Self {
        Self {
            source_account: source_account.into(),
            destinations,
            options: ScrapeOptions::default(),
            item_timeout: None,
        }
    }
}

/// A piece of content as yielded by a source adapter
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Source-native id
    pub id: String,
    /// Media kind
    pub kind: MediaKind,
    /// Link the payload is fetched from
    pub link: String,
    /// Human title
    pub title: String,
    /// Suggested filename, if the source knows one
    pub file_name: Option<String>,
    /// File extension without the dot (may be empty)
    pub ext: String,
    /// Account the post was found under
    pub source_account: String,
}

/// One discovered content unit within a task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Source-native id
    pub id: String,
    /// Link the payload is fetched from
    pub link: String,
    /// Human title
    pub title: String,
    /// Filename used at every destination
    pub file_name: String,
    /// Media kind
    pub kind: MediaKind,
    /// File extension without the dot
    pub ext: String,
    /// Account the item was found under
    pub source_account: String,
    /// Resolved destination path of the most recent write
    #[serde(default)]
    pub dst: Option<String>,
    /// Bound on a single download attempt
    #[serde(default, with = "optional_duration_ms")]
    pub timeout: Option<Duration>,
    /// Downloaded payload (transient, never persisted)
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
}

/// Lifecycle phase of a task
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Submitted, nothing discovered yet
    #[default]
    Created,
    /// At least one item discovered
    Started,
    /// Discovery finished and every item accounted for
    Completed,
}

/// Progress of a task
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Items accounted for (delivered, skipped or failed)
    pub items_done: u64,
    /// Items discovered so far
    pub total_items: u64,
    /// Lifecycle phase
    pub phase: Phase,
    /// Whether the discovery drain for this task has ended
    #[serde(default)]
    pub discovery_finished: bool,
    /// Items whose download failed
    #[serde(default)]
    pub failed: u64,
    /// Items that already existed at every destination
    #[serde(default)]
    pub skipped: u64,
    /// Successful destination writes
    #[serde(default)]
    pub written: u64,
}

impl TaskStatus {
    /// Whether every discovered item has been accounted for
    pub fn is_done(&self) -> bool {
        self.items_done >= self.total_items && self.phase != Phase::Created
    }
}

/// How a single item was accounted for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Payload fetched and every remaining destination attempted
    Processed {
        /// Destinations that accepted the write
        written: u64,
    },
    /// Item already present at every destination
    Skipped,
    /// Payload could not be fetched
    Failed,
}

/// The durable record of one submitted job and its progress
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task id
    pub id: TaskId,
    /// The originating job
    pub job: Job,
    /// Items discovered so far, in discovery order
    pub items: Vec<Item>,
    /// Progress
    pub status: TaskStatus,
    /// Identities of the resolved destination stores
    pub store_ids: Vec<String>,
    /// When the task was submitted
    pub created_at: DateTime<Utc>,
    /// When the task record was last written
    pub updated_at: DateTime<Utc>,
}

/// Event emitted during task processing
///
/// Consumers subscribe to these events to observe progress without polling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A task was accepted
    TaskCreated {
        /// Task id
        id: TaskId,
        /// Source-account identifier
        source_account: String,
    },
    /// An item was appended to a task
    ItemDiscovered {
        /// Task id
        id: TaskId,
        /// Item id
        item_id: String,
        /// Media kind
        kind: MediaKind,
    },
    /// An item already existed everywhere and was not downloaded
    ItemSkipped {
        /// Task id
        id: TaskId,
        /// Item id
        item_id: String,
    },
    /// An item was written to a destination
    ItemDelivered {
        /// Task id
        id: TaskId,
        /// Item id
        item_id: String,
        /// Destination store identity
        store: String,
        /// Path reported by the store
        path: String,
    },
    /// An item could not be fetched or written
    ItemFailed {
        /// Task id
        id: TaskId,
        /// Item id
        item_id: String,
        /// Error message
        error: String,
    },
    /// The source adapter failed for a task's account
    DiscoveryFailed {
        /// Task id
        id: TaskId,
        /// Source-account identifier
        source_account: String,
        /// Error message
        error: String,
    },
    /// The discovery drain for a task ended
    DiscoveryFinished {
        /// Task id
        id: TaskId,
        /// Items discovered
        total_items: u64,
    },
    /// Every discovered item was accounted for
    TaskCompleted {
        /// Task id
        id: TaskId,
        /// Final status
        status: TaskStatus,
    },
    /// The scraper is shutting down
    Shutdown,
}

// Optional Duration serialization helper (milliseconds)
mod optional_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&(d.as_millis() as u64)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

//! Configuration types for content-pirate

use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Worker pool sizes and queue capacities
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Discovery workers pulling source-account identifiers (default: 5)
    #[serde(default = "default_workers")]
    pub topic_workers: usize,

    /// Download workers for images (default: 5)
    #[serde(default = "default_workers")]
    pub image_workers: usize,

    /// Download workers for videos (default: 5)
    #[serde(default = "default_workers")]
    pub video_workers: usize,

    /// Download workers for forwarded messages (default: 5)
    #[serde(default = "default_workers")]
    pub message_workers: usize,

    /// Capacity of the discovery queue (default: 10)
    #[serde(default = "default_discovery_capacity")]
    pub discovery_queue_capacity: usize,

    /// Capacity of each per-kind download queue (default: 100)
    #[serde(default = "default_download_capacity")]
    pub download_queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            topic_workers: default_workers(),
            image_workers: default_workers(),
            video_workers: default_workers(),
            message_workers: default_workers(),
            discovery_queue_capacity: default_discovery_capacity(),
            download_queue_capacity: default_download_capacity(),
        }
    }
}

impl WorkerConfig {
    /// Replace zero sizes with their defaults
    pub fn normalized(&self) -> Self {
        fn or_default(value: usize, default: usize) -> usize {
            if value == 0 { default } else { value }
        }

        Self {
            topic_workers: or_default(self.topic_workers, default_workers()),
            image_workers: or_default(self.image_workers, default_workers()),
            video_workers: or_default(self.video_workers, default_workers()),
            message_workers: or_default(self.message_workers, default_workers()),
            discovery_queue_capacity: or_default(
                self.discovery_queue_capacity,
                default_discovery_capacity(),
            ),
            download_queue_capacity: or_default(
                self.download_queue_capacity,
                default_download_capacity(),
            ),
        }
    }
}

/// Download behavior configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Default bound on one download attempt (default: 60 seconds, None = unbounded)
    ///
    /// A job's own `item_timeout` takes precedence.
    #[serde(
        default = "default_item_timeout",
        with = "optional_duration_serde"
    )]
    pub item_timeout: Option<Duration>,

    /// Interval between status polls in `wait_on_task` (default: 5 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            item_timeout: default_item_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

/// Where task records and the dedup cache live
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateBackend {
    /// Volatile in-process map (default)
    #[default]
    Memory,
    /// SQLite database file
    Sqlite {
        /// Database path
        path: PathBuf,
    },
}

/// Data storage and state management
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// State backend (default: memory)
    #[serde(default)]
    pub state_backend: StateBackend,
}

/// Retry configuration for adapters that back off on rate limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 5)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Main configuration for [`Scraper`](crate::Scraper)
///
/// Fields are organized into logical sub-configs:
/// - [`workers`](WorkerConfig) - pool sizes and queue capacities
/// - [`download`](DownloadConfig) - timeouts and polling
/// - [`persistence`](PersistenceConfig) - state backend
/// - [`retry`](RetryConfig) - backoff for adapters
///
/// The worker and download sub-configs are flattened, so the JSON/TOML form
/// keeps those keys at the top level.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Worker pool settings
    #[serde(flatten)]
    pub workers: WorkerConfig,

    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// Data storage and state management
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Backoff settings for adapters
    #[serde(default)]
    pub retry: RetryConfig,
}

fn default_workers() -> usize {
    5
}

fn default_discovery_capacity() -> usize {
    10
}

fn default_download_capacity() -> usize {
    100
}

fn default_item_timeout() -> Option<Duration> {
    Some(Duration::from_secs(60))
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

//! Error types for content-pirate
//!
//! This module provides the error taxonomy for the orchestration core:
//! - Submission-time failures returned synchronously (`UnknownDestination`, `Config`)
//! - Lookup failures (`NotFound`)
//! - Per-identifier, per-item and per-destination failures that the pipeline
//!   logs and absorbs (`SourceScrapeFailed`, `DownloadFailed`, `StoreWriteFailed`)
//! - Adapter-internal signals (`RateLimited`)
//! - Ambient failures from the state backend, serialization and I/O

use std::time::Duration;
use thiserror::Error;

use crate::types::TaskId;

/// Result type alias for content-pirate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for content-pirate
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "filter.include")
        key: Option<String>,
    },

    /// A destination descriptor could not be mapped to a concrete store
    #[error("unknown destination: {0}")]
    UnknownDestination(String),

    /// Task id is unknown to the state store
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// The source adapter failed to enumerate an account
    #[error("scraping {account} failed: {reason}")]
    SourceScrapeFailed {
        /// Source-account identifier that was being scraped
        account: String,
        /// Adapter-supplied reason
        reason: String,
    },

    /// Fetching an item's payload failed or timed out
    #[error("download of item {item_id} failed: {reason}")]
    DownloadFailed {
        /// Source-native item id
        item_id: String,
        /// Reason the download failed
        reason: String,
    },

    /// Writing an item to one destination failed
    #[error("write of {file_name} to store {store} failed: {reason}")]
    StoreWriteFailed {
        /// Identity of the destination store
        store: String,
        /// Filename that was being written
        file_name: String,
        /// Reason the write failed
        reason: String,
    },

    /// The remote side asked us to slow down
    #[error("rate limited{}", .retry_after.map(|d| format!(", retry after {}s", d.as_secs())).unwrap_or_default())]
    RateLimited {
        /// Server-provided hint for how long to back off
        retry_after: Option<Duration>,
    },

    /// An operation exceeded its deadline
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// State backend operation failed
    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Shutdown in progress - not accepting new jobs
    #[error("shutdown in progress: not accepting new jobs")]
    ShuttingDown,

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// State backend errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to connect to database
    #[error("failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to run migrations
    #[error("failed to run migrations: {0}")]
    MigrationFailed(String),

    /// Query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}

impl Error {
    /// Machine-readable error code, used in events and log fields
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::UnknownDestination(_) => "unknown_destination",
            Error::NotFound(_) => "not_found",
            Error::SourceScrapeFailed { .. } => "source_scrape_failed",
            Error::DownloadFailed { .. } => "download_failed",
            Error::StoreWriteFailed { .. } => "store_write_failed",
            Error::RateLimited { .. } => "rate_limited",
            Error::Timeout(_) => "timeout",
            Error::Database(_) | Error::Sqlx(_) => "database_error",
            Error::Serialization(_) => "serialization_error",
            Error::Io(_) => "io_error",
            Error::ShuttingDown => "shutting_down",
            Error::Other(_) => "internal_error",
        }
    }

    /// Whether this error is rejected synchronously at submission
    pub fn is_submission_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownDestination(_) | Error::Config { .. } | Error::ShuttingDown
        )
    }
}

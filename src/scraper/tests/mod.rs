use super::test_helpers::*;
use super::*;
use crate::error::Error;
use crate::types::{Destination, Event, Job, MediaKind, Phase, TaskId};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tempfile::TempDir;

mod discovery;

fn file_destination(base: &Path) -> Destination {
    Destination::File {
        base_path: base.to_path_buf(),
        clean_on_start: false,
    }
}

/// Number of regular files under `dir`
fn count_files(dir: &Path) -> usize {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .count()
}

/// Wait for completion and return the final status
async fn run_to_completion(scraper: &Scraper, id: TaskId) -> crate::types::TaskStatus {
    assert!(
        scraper.wait_on_task(id, Duration::from_secs(10)).await.unwrap(),
        "task should complete"
    );
    scraper.check_status(id).await.unwrap()
}

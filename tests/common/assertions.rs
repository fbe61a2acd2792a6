//! Assertions and event collection helpers

use std::path::{Path, PathBuf};
use std::time::Duration;

use content_pirate::{Event, TaskId};
use tokio::sync::broadcast;

/// Collect events until `TaskCompleted` for `id` arrives
///
/// Panics if it does not arrive within `timeout`.
pub async fn collect_events_until_complete(
    events: &mut broadcast::Receiver<Event>,
    id: TaskId,
    timeout: Duration,
) -> Vec<Event> {
    let mut collected = Vec::new();

    let result = tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let done = matches!(&event, Event::TaskCompleted { id: done, .. } if *done == id);
                    collected.push(event);
                    if done {
                        return;
                    }
                }
                Err(e) => panic!("event channel failed: {}", e),
            }
        }
    })
    .await;

    assert!(result.is_ok(), "task {} did not complete within {:?}", id, timeout);
    collected
}

/// Regular files under `dir`, sorted
pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

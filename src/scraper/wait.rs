//! Blocking on task completion.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::types::{Phase, TaskId};

use super::Scraper;

impl Scraper {
    /// Wait until a task completes or `timeout` elapses
    ///
    /// Polls the task status every `poll_interval` (see
    /// [`DownloadConfig`](crate::config::DownloadConfig)). Returns `true` once
    /// discovery has ended and every discovered item is accounted for,
    /// `false` when the deadline passes first. The last sleep is shortened
    /// so the call returns promptly at the deadline.
    ///
    /// Timing out only stops the caller from waiting; in-flight work for the
    /// task continues.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the id is unknown.
    pub async fn wait_on_task(&self, id: TaskId, timeout: Duration) -> Result<bool> {
        self.wait_on_task_with_cancel(id, timeout, CancellationToken::new())
            .await
    }

    /// Like [`wait_on_task`](Self::wait_on_task), but also returns `false`
    /// as soon as `cancel` is triggered
    pub async fn wait_on_task_with_cancel(
        &self,
        id: TaskId,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let poll_interval = self.config.download.poll_interval;

        loop {
            let status = self.check_status(id).await?;
            if status.phase == Phase::Completed {
                return Ok(true);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::debug!(
                    task_id = %id,
                    items_done = status.items_done,
                    total_items = status.total_items,
                    "Timed out waiting for task"
                );
                return Ok(false);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!(task_id = %id, "Wait cancelled");
                    return Ok(false);
                }
                _ = tokio::time::sleep(poll_interval.min(remaining)) => {}
            }
        }
    }
}

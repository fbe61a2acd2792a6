//! Task record reads and serialized updates.
//!
//! Task records live in the state store as JSON under the `task`
//! namespace. Every update is a read-modify-write performed while holding
//! the scraper's task lock, so concurrent workers never lose an increment.
//! Events are emitted after the lock is released.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::kv::TASK_NAMESPACE;
use crate::types::{Event, Item, ItemOutcome, Phase, Task, TaskId, TaskStatus};

use super::Scraper;

impl Scraper {
    /// Get a snapshot of a task
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is unknown to the state store.
    pub async fn get_task(&self, id: TaskId) -> Result<Task> {
        self.load_task(id).await?.ok_or(Error::NotFound(id))
    }

    /// Get the progress of a task
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is unknown to the state store.
    pub async fn check_status(&self, id: TaskId) -> Result<TaskStatus> {
        Ok(self.get_task(id).await?.status)
    }

    /// Ids of every task known to the state store, oldest first
    pub async fn list_tasks(&self) -> Result<Vec<TaskId>> {
        let mut tasks = Vec::new();
        for key in self.kv.keys(TASK_NAMESPACE).await? {
            let id: TaskId = match key.parse() {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Ignoring malformed task key");
                    continue;
                }
            };
            if let Some(task) = self.load_task(id).await? {
                tasks.push((task.created_at, id));
            }
        }

        tasks.sort();
        Ok(tasks.into_iter().map(|(_, id)| id).collect())
    }

    async fn load_task(&self, id: TaskId) -> Result<Option<Task>> {
        match self.kv.get(TASK_NAMESPACE, &id.to_string()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub(crate) async fn save_task(&self, task: &Task) -> Result<()> {
        let bytes = serde_json::to_vec(task)?;
        self.kv
            .set(TASK_NAMESPACE, &task.id.to_string(), &bytes)
            .await
    }

    pub(crate) async fn remove_task(&self, id: TaskId) -> Result<()> {
        self.kv.delete(TASK_NAMESPACE, &id.to_string()).await?;
        Ok(())
    }

    /// Apply `f` to a task record under the task lock and persist the result
    async fn modify_task<F, R>(&self, id: TaskId, f: F) -> Result<R>
    where
        F: FnOnce(&mut Task) -> R,
    {
        let _guard = self.task_lock.lock().await;

        let mut task = self.get_task(id).await?;
        let result = f(&mut task);
        task.updated_at = Utc::now();
        self.save_task(&task).await?;

        Ok(result)
    }

    /// Append a discovered item, growing `total_items` and starting the task
    pub(crate) async fn append_item(&self, id: TaskId, item: Item) -> Result<()> {
        let item_id = item.id.clone();
        let kind = item.kind;

        self.modify_task(id, move |task| {
            task.items.push(item);
            task.status.total_items = task.items.len() as u64;
            if task.status.phase == Phase::Created {
                task.status.phase = Phase::Started;
            }
        })
        .await?;

        self.emit_event(Event::ItemDiscovered { id, item_id, kind });
        Ok(())
    }

    /// Attach the destination path of a successful write to the task's item
    pub(crate) async fn record_delivery(&self, id: TaskId, item_id: &str, dst: &str) -> Result<()> {
        self.modify_task(id, |task| {
            for item in task.items.iter_mut().filter(|item| item.id == item_id) {
                item.dst = Some(dst.to_string());
            }
        })
        .await
    }

    /// Account for one item; called exactly once per discovered item
    pub(crate) async fn increment_done(&self, id: TaskId, outcome: ItemOutcome) -> Result<()> {
        let completed = self
            .modify_task(id, |task| {
                let status = &mut task.status;
                if status.items_done < status.total_items {
                    status.items_done += 1;
                } else {
                    tracing::error!(
                        task_id = %id,
                        items_done = status.items_done,
                        total_items = status.total_items,
                        "Item accounted for twice"
                    );
                }

                match outcome {
                    ItemOutcome::Processed { written } => status.written += written,
                    ItemOutcome::Skipped => status.skipped += 1,
                    ItemOutcome::Failed => status.failed += 1,
                }

                complete_if_done(status)
            })
            .await?;

        if let Some(status) = completed {
            self.announce_completion(id, status);
        }
        Ok(())
    }

    /// Record that the discovery drain for a task has ended
    pub(crate) async fn finish_discovery(&self, id: TaskId) -> Result<()> {
        let (total_items, completed) = self
            .modify_task(id, |task| {
                let status = &mut task.status;
                status.discovery_finished = true;
                (status.total_items, complete_if_done(status))
            })
            .await?;

        tracing::debug!(task_id = %id, total_items, "Discovery finished");
        self.emit_event(Event::DiscoveryFinished { id, total_items });

        if let Some(status) = completed {
            self.announce_completion(id, status);
        }
        Ok(())
    }

    fn announce_completion(&self, id: TaskId, status: TaskStatus) {
        tracing::info!(
            task_id = %id,
            total_items = status.total_items,
            written = status.written,
            skipped = status.skipped,
            failed = status.failed,
            "Task completed"
        );
        self.emit_event(Event::TaskCompleted { id, status });
    }
}

/// Move a task to `Completed` once discovery has ended and every item is
/// accounted for; returns the final status on that transition only
fn complete_if_done(status: &mut TaskStatus) -> Option<TaskStatus> {
    let accounted = status.phase == Phase::Created || status.items_done >= status.total_items;
    if status.discovery_finished && status.phase != Phase::Completed && accounted {
        status.phase = Phase::Completed;
        return Some(status.clone());
    }
    None
}

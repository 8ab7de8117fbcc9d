//! In-memory task queue with single-claimant and visibility-timeout
//! semantics.
//!
//! `QUEUE_URL` is accepted for configuration parity with an external
//! queue deployment, but this implementation is in-process.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;

use crate::model::{ExtractionTask, TaskStatus};

struct QueueState {
    tasks: HashMap<String, ExtractionTask>,
    /// `file_url -> task_id`, for enqueue-time dedup of non-terminal tasks.
    by_file_url: HashMap<String, String>,
    /// FIFO of task ids currently `pending`.
    pending: std::collections::VecDeque<String>,
}

pub struct TaskQueue {
    state: Mutex<QueueState>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                tasks: HashMap::new(),
                by_file_url: HashMap::new(),
                pending: std::collections::VecDeque::new(),
            }),
        }
    }

    /// Enqueues `task`. If a non-terminal task already exists for the same
    /// `file_url`, returns its `task_id` instead of creating a duplicate.
    pub fn enqueue(&self, task: ExtractionTask) -> String {
        let mut state = self.state.lock();

        if let Some(existing_id) = state.by_file_url.get(&task.file_url) {
            if let Some(existing) = state.tasks.get(existing_id) {
                if !existing.is_terminal() {
                    return existing.task_id.clone();
                }
            }
        }

        let task_id = task.task_id.clone();
        state.by_file_url.insert(task.file_url.clone(), task_id.clone());
        state.pending.push_back(task_id.clone());
        state.tasks.insert(task_id.clone(), task);
        task_id
    }

    /// Claims the oldest pending task, transitioning it to `processing`.
    /// Exactly one caller can claim a given task (guarded by the queue's
    /// single lock), matching the "single-claimant guarantee" contract.
    pub fn claim(&self) -> Option<ExtractionTask> {
        let mut state = self.state.lock();
        let task_id = state.pending.pop_front()?;
        let task = state.tasks.get_mut(&task_id)?;
        task.status = TaskStatus::Processing;
        task.updated_at = Utc::now();
        Some(task.clone())
    }

    pub fn complete(&self, task_id: &str, result: serde_json::Value) {
        let mut state = self.state.lock();
        if let Some(task) = state.tasks.get_mut(task_id) {
            task.status = TaskStatus::Completed;
            task.result = Some(result);
            task.updated_at = Utc::now();
        }
    }

    pub fn fail(&self, task_id: &str, error: impl Into<String>) {
        let mut state = self.state.lock();
        if let Some(task) = state.tasks.get_mut(task_id) {
            task.status = TaskStatus::Failed;
            task.error = Some(error.into());
            task.updated_at = Utc::now();
        }
    }

    pub fn get(&self, task_id: &str) -> Option<ExtractionTask> {
        self.state.lock().tasks.get(task_id).cloned()
    }

    /// Requeues any task stuck in `processing` for longer than
    /// `visibility_timeout` — the recovery path for a worker crash before a
    /// terminal write.
    pub fn reclaim_expired(&self, visibility_timeout: Duration) -> Vec<String> {
        let mut state = self.state.lock();
        let now = Utc::now();
        let mut reclaimed = Vec::new();

        let expired_ids: Vec<String> = state
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Processing)
            .filter(|t| {
                now.signed_duration_since(t.updated_at)
                    .to_std()
                    .map(|age| age > visibility_timeout)
                    .unwrap_or(false)
            })
            .map(|t| t.task_id.clone())
            .collect();

        for id in expired_ids {
            if let Some(task) = state.tasks.get_mut(&id) {
                task.status = TaskStatus::Pending;
                task.updated_at = now;
                reclaimed.push(id.clone());
            }
        }
        for id in &reclaimed {
            state.pending.push_back(id.clone());
        }

        reclaimed
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExtractionDataType, FileMetadata};

    fn task(id: &str, file_url: &str) -> ExtractionTask {
        ExtractionTask::new(
            id.to_string(),
            "C1".to_string(),
            file_url.to_string(),
            "restaurant".to_string(),
            ExtractionDataType::Catalog,
            FileMetadata {
                file_name: "menu.pdf".into(),
                content_type: "application/pdf".into(),
                size_bytes: 1024,
            },
            "https://backend.example.com/callback".to_string(),
        )
    }

    #[test]
    fn duplicate_enqueue_for_same_file_returns_first_task_id() {
        let queue = TaskQueue::new();
        let id1 = queue.enqueue(task("t1", "https://files/menu.pdf"));
        let id2 = queue.enqueue(task("t2", "https://files/menu.pdf"));
        assert_eq!(id1, id2);
        assert_eq!(id1, "t1");
    }

    #[test]
    fn enqueue_after_terminal_creates_a_new_task() {
        let queue = TaskQueue::new();
        let id1 = queue.enqueue(task("t1", "https://files/menu.pdf"));
        queue.complete(&id1, serde_json::json!({}));
        let id2 = queue.enqueue(task("t2", "https://files/menu.pdf"));
        assert_eq!(id2, "t2");
    }

    #[test]
    fn claim_transitions_to_processing_and_is_single_claimant() {
        let queue = TaskQueue::new();
        queue.enqueue(task("t1", "https://files/a.pdf"));
        let claimed = queue.claim().unwrap();
        assert_eq!(claimed.status, TaskStatus::Processing);
        assert!(queue.claim().is_none());
    }

    #[test]
    fn expired_processing_task_is_reclaimed_to_pending() {
        let queue = TaskQueue::new();
        queue.enqueue(task("t1", "https://files/a.pdf"));
        let claimed = queue.claim().unwrap();
        {
            let mut state = queue.state.lock();
            let t = state.tasks.get_mut(&claimed.task_id).unwrap();
            t.updated_at = Utc::now() - chrono::Duration::seconds(1000);
        }

        let reclaimed = queue.reclaim_expired(Duration::from_secs(60));
        assert_eq!(reclaimed, vec!["t1".to_string()]);
        assert!(queue.claim().is_some());
    }
}

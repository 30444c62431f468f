//! Task synchronization controller.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::store::{StoreError, TaskStore};
use crate::task::{Task, TaskId};

/// Result of a controller operation, for the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The store confirmed the write and the list was updated.
    Applied,
    /// Refused before reaching the store; nothing changed.
    Skipped,
    /// The store call failed; the list is as it was.
    Failed,
}

/// The most recent failed store call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncFailure {
    pub operation: String,
    pub message: String,
    pub at: chrono::DateTime<chrono::Utc>,
}

/// Owns the in-memory task list and mediates every change through the store.
pub struct TaskController {
    store: Arc<dyn TaskStore>,
    tasks: RwLock<Vec<Task>>,
    loading: AtomicBool,
    last_failure: RwLock<Option<SyncFailure>>,
}

impl TaskController {
    /// Create a controller with an empty list, in the loading state.
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self {
            store,
            tasks: RwLock::new(Vec::new()),
            loading: AtomicBool::new(true),
            last_failure: RwLock::new(None),
        }
    }

    /// Create a controller and perform the initial load.
    pub async fn start(store: Arc<dyn TaskStore>) -> Self {
        let controller = Self::new(store);
        controller.load().await;
        controller
    }

    /// Snapshot of the current list, newest first.
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.read().await.clone()
    }

    /// True until the first load has resolved, successfully or not.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// The most recent failed store call, if it has not been cleared.
    pub async fn last_failure(&self) -> Option<SyncFailure> {
        self.last_failure.read().await.clone()
    }

    /// Dismiss the recorded failure.
    pub async fn clear_failure(&self) {
        *self.last_failure.write().await = None;
    }

    /// Replace the list with the store's contents.
    ///
    /// On failure the list keeps its previous contents, which before the first
    /// successful load is the empty list. Either way loading ends.
    pub async fn load(&self) -> Outcome {
        let outcome = match self.store.list_all().await {
            Ok(loaded) => {
                let mut seen = HashSet::with_capacity(loaded.len());
                let deduped: Vec<Task> = loaded
                    .into_iter()
                    .filter(|t| seen.insert(t.id.clone()))
                    .collect();
                tracing::info!("Loaded {} tasks", deduped.len());
                *self.tasks.write().await = deduped;
                Outcome::Applied
            }
            Err(e) => self.report("load", e).await,
        };

        self.loading.store(false, Ordering::Release);
        outcome
    }

    /// Create a task and put it at the head of the list.
    pub async fn add_task(&self, title: &str) -> Outcome {
        let title = title.trim();
        if title.is_empty() {
            tracing::debug!("Ignoring add with empty title");
            return Outcome::Skipped;
        }

        match self.store.create(title).await {
            Ok(task) => {
                tracing::info!("Created task {}", task.id);
                let mut tasks = self.tasks.write().await;
                // A concurrent load may already have picked the new row up.
                tasks.retain(|t| t.id != task.id);
                tasks.insert(0, task);
                Outcome::Applied
            }
            Err(e) => self.report("add", e).await,
        }
    }

    /// Flip `completed` on the task with `id`.
    ///
    /// Ids not in the list are ignored without contacting the store. On
    /// success the list takes the value the store accepted, so overlapping
    /// toggles end with whichever write resolved last.
    pub async fn toggle_task(&self, id: &TaskId) -> Outcome {
        let current = {
            let tasks = self.tasks.read().await;
            tasks.iter().find(|t| &t.id == id).map(|t| t.completed)
        };

        let Some(completed) = current else {
            tracing::debug!("Ignoring toggle of unknown task {}", id);
            return Outcome::Skipped;
        };

        let target = !completed;
        match self.store.set_completed(id, target).await {
            Ok(()) => {
                self.with_task(id, |t| t.completed = target).await;
                Outcome::Applied
            }
            Err(e) => self.report("toggle", e).await,
        }
    }

    /// Replace the title of the task with `id`.
    pub async fn update_task(&self, id: &TaskId, title: &str) -> Outcome {
        let title = title.trim();
        if title.is_empty() {
            tracing::debug!("Ignoring update of {} with empty title", id);
            return Outcome::Skipped;
        }

        match self.store.set_title(id, title).await {
            Ok(()) => {
                self.with_task(id, |t| t.title = title.to_string()).await;
                Outcome::Applied
            }
            Err(e) => self.report("update", e).await,
        }
    }

    /// Delete the task with `id`.
    pub async fn delete_task(&self, id: &TaskId) -> Outcome {
        match self.store.remove(id).await {
            Ok(()) => {
                tracing::info!("Deleted task {}", id);
                self.tasks.write().await.retain(|t| &t.id != id);
                Outcome::Applied
            }
            Err(e) => self.report("delete", e).await,
        }
    }

    async fn with_task(&self, id: &TaskId, apply: impl FnOnce(&mut Task)) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.iter_mut().find(|t| &t.id == id) {
            apply(task);
        }
    }

    async fn report(&self, operation: &str, error: StoreError) -> Outcome {
        tracing::error!("Error during task {}: {}", operation, error);
        *self.last_failure.write().await = Some(SyncFailure {
            operation: operation.to_string(),
            message: error.to_string(),
            at: chrono::Utc::now(),
        });
        Outcome::Failed
    }
}

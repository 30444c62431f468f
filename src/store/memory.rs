//! In-process task store.
//!
//! Holds rows in the remote record shape and runs them through the same
//! translation as the Supabase client. Used by tests and by the binary when no
//! Supabase project is configured.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore};
use crate::task::{parse_timestamp_millis, DbTask, Task, TaskId};

/// Store operations, used for failure injection and call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    ListAll,
    Create,
    SetCompleted,
    SetTitle,
    Remove,
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ListAll => "list_all",
            Self::Create => "create",
            Self::SetCompleted => "set_completed",
            Self::SetTitle => "set_title",
            Self::Remove => "remove",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<DbTask>,
    last_created: Option<DateTime<Utc>>,
    calls: HashMap<StoreOp, usize>,
    fail_next: Vec<StoreOp>,
    fail_all: bool,
}

impl Inner {
    /// Count the call and decide whether it should fail.
    fn enter(&mut self, op: StoreOp) -> StoreResult<()> {
        *self.calls.entry(op).or_insert(0) += 1;

        if self.fail_all {
            return Err(StoreError::Unavailable(format!("{} failed (store down)", op)));
        }
        if let Some(pos) = self.fail_next.iter().position(|o| *o == op) {
            self.fail_next.remove(pos);
            return Err(StoreError::Unavailable(format!("{} failed (injected)", op)));
        }
        Ok(())
    }

    /// Strictly increasing creation time.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_created {
            Some(last) if now <= last => last + Duration::milliseconds(1),
            _ => now,
        };
        self.last_created = Some(ts);
        ts
    }

    fn find_mut(&mut self, id: &TaskId) -> StoreResult<&mut DbTask> {
        self.rows
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }
}

/// Task store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    inner: Mutex<Inner>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with rows in the remote shape.
    pub fn with_rows(rows: Vec<DbTask>) -> Self {
        let last_created = rows
            .iter()
            .filter_map(|r| parse_timestamp_millis(&r.created_at))
            .max()
            .and_then(DateTime::<Utc>::from_timestamp_millis);

        Self {
            inner: Mutex::new(Inner {
                rows,
                last_created,
                ..Inner::default()
            }),
        }
    }

    /// Make the next call of `op` fail. Repeated calls queue more failures.
    pub fn fail_next(&self, op: StoreOp) {
        self.lock().fail_next.push(op);
    }

    /// Make every call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().fail_all = unavailable;
    }

    /// Number of times `op` reached the store, failed calls included.
    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Total number of calls across all operations.
    pub fn total_calls(&self) -> usize {
        self.lock().calls.values().sum()
    }

    /// Copy of the stored rows, in insertion order.
    pub fn rows(&self) -> Vec<DbTask> {
        self.lock().rows.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave rows half-written.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_all(&self) -> StoreResult<Vec<Task>> {
        let rows = {
            let mut inner = self.lock();
            inner.enter(StoreOp::ListAll)?;
            inner.rows.clone()
        };

        let mut tasks = rows
            .into_iter()
            .map(Task::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn create(&self, title: &str) -> StoreResult<Task> {
        let row = {
            let mut inner = self.lock();
            inner.enter(StoreOp::Create)?;
            let created_at = inner.next_created_at();
            let row = DbTask {
                id: TaskId::new(Uuid::new_v4().to_string()),
                title: title.to_string(),
                completed: false,
                created_at: created_at.to_rfc3339_opts(SecondsFormat::Micros, false),
            };
            inner.rows.push(row.clone());
            row
        };

        Task::try_from(row)
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.enter(StoreOp::SetCompleted)?;
        inner.find_mut(id)?.completed = completed;
        Ok(())
    }

    async fn set_title(&self, id: &TaskId, title: &str) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.enter(StoreOp::SetTitle)?;
        inner.find_mut(id)?.title = title.to_string();
        Ok(())
    }

    async fn remove(&self, id: &TaskId) -> StoreResult<()> {
        let mut inner = self.lock();
        inner.enter(StoreOp::Remove)?;
        inner.rows.retain(|r| &r.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, title: &str, created_at: &str) -> DbTask {
        DbTask {
            id: TaskId::new(id),
            title: title.to_string(),
            completed: false,
            created_at: created_at.to_string(),
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_created_at_desc() {
        let store = MemoryTaskStore::with_rows(vec![
            row("a", "A", "2024-03-01T12:00:03Z"),
            row("b", "B", "2024-03-01T12:00:01Z"),
            row("c", "C", "2024-03-01T12:00:02Z"),
        ]);

        let ids: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[tokio::test]
    async fn test_created_tasks_sort_after_seeded_ones() {
        let store = MemoryTaskStore::with_rows(vec![row("old", "Old", "2999-01-01T00:00:00Z")]);

        let first = store.create("first").await.unwrap();
        let second = store.create("second").await.unwrap();
        assert!(first.created_at > parse_timestamp_millis("2999-01-01T00:00:00Z").unwrap());
        assert!(second.created_at > first.created_at);

        let tasks = store.list_all().await.unwrap();
        assert_eq!(tasks[0].id, second.id);
        assert_eq!(tasks[2].id.as_str(), "old");
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let store = MemoryTaskStore::new();
        store.fail_next(StoreOp::Create);

        assert!(store.create("x").await.is_err());
        assert!(store.create("x").await.is_ok());
        assert_eq!(store.calls(StoreOp::Create), 2);
        assert_eq!(store.rows().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let store = MemoryTaskStore::new();
        let ghost = TaskId::new("ghost");

        assert!(matches!(
            store.set_completed(&ghost, true).await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.set_title(&ghost, "x").await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_of_unknown_id_succeeds() {
        let store = MemoryTaskStore::with_rows(vec![row("a", "A", "2024-03-01T12:00:03Z")]);

        store.remove(&TaskId::new("ghost")).await.unwrap();
        assert_eq!(store.rows().len(), 1);
        store.remove(&TaskId::new("a")).await.unwrap();
        store.remove(&TaskId::new("a")).await.unwrap();
        assert!(store.rows().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_everything() {
        let store = MemoryTaskStore::new();
        store.set_unavailable(true);

        assert!(store.list_all().await.is_err());
        assert!(store.create("x").await.is_err());
        assert_eq!(store.total_calls(), 2);

        store.set_unavailable(false);
        assert!(store.list_all().await.unwrap().is_empty());
    }
}

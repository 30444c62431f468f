//! Task store module - the remote persistence contract.
//!
//! This module provides a trait-based abstraction over the `tasks` collection,
//! with Supabase (PostgREST) as the primary implementation and an in-process
//! store for tests and local runs.

mod memory;
mod supabase;

pub use memory::{MemoryTaskStore, StoreOp};
pub use supabase::SupabaseTaskStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::task::{Task, TaskId};

/// Failure of a remote store operation.
///
/// Callers are expected to treat every variant the same way; the variants only
/// exist so that diagnostics say what went wrong.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store rejected the request: {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("no task with id {0}")]
    NotFound(TaskId),

    #[error("unexpected response: {0}")]
    Decode(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The four semantic operations on the `tasks` collection, plus the full load.
///
/// Implementations are stateless per call; nothing is cached between calls.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// All tasks, newest `created_at` first.
    async fn list_all(&self) -> StoreResult<Vec<Task>>;

    /// Insert a task with `completed = false` and return it as stored.
    async fn create(&self, title: &str) -> StoreResult<Task>;

    /// Set `completed` on exactly the task matching `id`.
    async fn set_completed(&self, id: &TaskId, completed: bool) -> StoreResult<()>;

    /// Set `title` on exactly the task matching `id`.
    async fn set_title(&self, id: &TaskId, title: &str) -> StoreResult<()>;

    /// Delete exactly the task matching `id`.
    async fn remove(&self, id: &TaskId) -> StoreResult<()>;
}

//! # tasksync
//!
//! Client-side task list kept in step with a remote Supabase `tasks` table.
//!
//! ## Architecture
//!
//! ```text
//!   presentation layer (HTTP / UI)
//!                │
//!                ▼
//!      ┌───────────────────┐
//!      │  TaskController   │  owns the in-memory list
//!      └─────────┬─────────┘
//!                │  Arc<dyn TaskStore>
//!                ▼
//!      ┌───────────────────┐
//!      │ SupabaseTaskStore │  PostgREST over HTTP
//!      └───────────────────┘
//! ```
//!
//! Every mutation is write-through: the in-memory list only changes after the
//! remote store has confirmed the write.
//!
//! ## Modules
//! - `task`: the `Task` entity and the remote record translation
//! - `store`: the `TaskStore` contract, Supabase and in-memory implementations
//! - `sync`: `TaskController`, the stateful synchronization layer
//! - `view`: filtering, search and progress counters over a snapshot
//! - `api`: HTTP routes exposing the controller
//! - `config`: environment configuration

pub mod api;
pub mod config;
pub mod store;
pub mod sync;
pub mod task;
pub mod view;

pub use config::Config;
pub use store::{MemoryTaskStore, StoreError, SupabaseTaskStore, TaskStore};
pub use sync::{Outcome, SyncFailure, TaskController};
pub use task::{Task, TaskId};

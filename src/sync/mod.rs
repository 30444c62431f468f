//! Synchronization module - keeps the in-memory task list in step with the store.
//!
//! The controller is write-through: the list changes only after the store has
//! confirmed the corresponding write. There is no pending or dirty state.

mod controller;

pub use controller::{Outcome, SyncFailure, TaskController};

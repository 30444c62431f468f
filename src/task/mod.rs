//! Task module - the task entity and its remote record shape.
//!
//! - `Task` is the local representation held by the controller
//! - `DbTask` is the row as returned by the remote `tasks` collection
//! - Conversion from `DbTask` to `Task` is fallible and is the only way a
//!   remote record becomes a `Task`

mod types;

pub use types::{parse_timestamp_millis, DbTask, NewDbTask, Task, TaskId};

//! HTTP API exposing the task controller to a presentation layer.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Liveness
//! - `GET /api/tasks` - Current list, with optional `filter` and `search`
//! - `POST /api/tasks` - Add a task
//! - `POST /api/tasks/:id/toggle` - Flip completion
//! - `PUT /api/tasks/:id` - Rename
//! - `DELETE /api/tasks/:id` - Delete
//! - `DELETE /api/failure` - Dismiss the last reported failure

mod routes;
mod tasks;

pub use routes::{app, serve, AppState};
pub use tasks::{ListResponse, MutationResponse, TitleRequest};

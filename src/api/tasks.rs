//! Task API endpoints.
//!
//! Mutations always answer 200 with the outcome and the resulting list; a
//! failed store call shows up as `"outcome": "failed"` and an unchanged list,
//! never as an HTTP error.

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::routes::AppState;
use crate::sync::{Outcome, SyncFailure};
use crate::task::{Task, TaskId};
use crate::view::{filter_tasks, Filter, TaskCounts};

/// Create task routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tasks).post(add_task))
        .route("/:id", axum::routing::put(update_task).delete(delete_task))
        .route("/:id/toggle", post(toggle_task))
}

// ─────────────────────────────────────────────────────────────────────────────
// Request/Response Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub filter: Filter,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub loading: bool,
    pub tasks: Vec<Task>,
    /// Counts over the whole list, not just the filtered view.
    pub counts: TaskCounts,
    pub completion_rate: u8,
    pub last_failure: Option<SyncFailure>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutationResponse {
    pub outcome: Outcome,
    pub tasks: Vec<Task>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET /api/tasks - Current list.
async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Json<ListResponse> {
    let controller = &state.controller;
    let all = controller.tasks().await;
    let counts = TaskCounts::of(&all);

    Json(ListResponse {
        loading: controller.is_loading(),
        tasks: filter_tasks(&all, query.filter, query.search.as_deref()),
        counts,
        completion_rate: counts.completion_rate(),
        last_failure: controller.last_failure().await,
    })
}

/// POST /api/tasks - Add a task.
async fn add_task(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TitleRequest>,
) -> Json<MutationResponse> {
    let outcome = state.controller.add_task(&req.title).await;
    respond(&state, outcome).await
}

/// POST /api/tasks/:id/toggle - Flip completion.
async fn toggle_task(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
) -> Json<MutationResponse> {
    let outcome = state.controller.toggle_task(&TaskId::new(id)).await;
    respond(&state, outcome).await
}

/// PUT /api/tasks/:id - Rename a task.
async fn update_task(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<TitleRequest>,
) -> Json<MutationResponse> {
    let outcome = state
        .controller
        .update_task(&TaskId::new(id), &req.title)
        .await;
    respond(&state, outcome).await
}

/// DELETE /api/tasks/:id - Delete a task.
async fn delete_task(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
) -> Json<MutationResponse> {
    let outcome = state.controller.delete_task(&TaskId::new(id)).await;
    respond(&state, outcome).await
}

async fn respond(state: &AppState, outcome: Outcome) -> Json<MutationResponse> {
    Json(MutationResponse {
        outcome,
        tasks: state.controller.tasks().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{json, Value};

    use crate::config::Config;
    use crate::store::{MemoryTaskStore, StoreOp};
    use crate::sync::TaskController;

    async fn spawn_api(store: Arc<MemoryTaskStore>, load: bool) -> (String, Arc<TaskController>) {
        let controller = Arc::new(TaskController::new(store));
        if load {
            controller.load().await;
        }

        let config = Config::from_lookup(|_| None).unwrap();
        let state = Arc::new(AppState {
            config,
            controller: Arc::clone(&controller),
        });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, crate::api::app(state)).await.unwrap();
        });
        (format!("http://{}", addr), controller)
    }

    #[tokio::test]
    async fn test_loading_flag_before_first_load() {
        let (base, controller) = spawn_api(Arc::new(MemoryTaskStore::new()), false).await;
        let client = reqwest::Client::new();

        let body: Value = client
            .get(format!("{}/api/tasks", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["loading"], json!(true));

        controller.load().await;
        let body: Value = client
            .get(format!("{}/api/health", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["loading"], json!(false));
    }

    #[tokio::test]
    async fn test_task_lifecycle_over_http() {
        let (base, _) = spawn_api(Arc::new(MemoryTaskStore::new()), true).await;
        let client = reqwest::Client::new();

        let created: Value = client
            .post(format!("{}/api/tasks", base))
            .json(&json!({ "title": "Buy milk" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(created["outcome"], "applied");
        assert_eq!(created["tasks"][0]["title"], "Buy milk");
        assert_eq!(created["tasks"][0]["completed"], json!(false));
        let id = created["tasks"][0]["id"].as_str().unwrap().to_string();

        let toggled: Value = client
            .post(format!("{}/api/tasks/{}/toggle", base, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(toggled["tasks"][0]["completed"], json!(true));

        let renamed: Value = client
            .put(format!("{}/api/tasks/{}", base, id))
            .json(&json!({ "title": "Buy oat milk" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(renamed["tasks"][0]["title"], "Buy oat milk");

        let listed: Value = client
            .get(format!("{}/api/tasks?filter=completed&search=OAT", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(listed["counts"]["completed"], json!(1));
        assert_eq!(listed["completionRate"], json!(100));

        let deleted: Value = client
            .delete(format!("{}/api/tasks/{}", base, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(deleted["outcome"], "applied");
        assert!(deleted["tasks"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failures_are_reported_not_raised() {
        let store = Arc::new(MemoryTaskStore::new());
        let (base, _) = spawn_api(store.clone(), true).await;
        let client = reqwest::Client::new();

        store.fail_next(StoreOp::Create);
        let resp = client
            .post(format!("{}/api/tasks", base))
            .json(&json!({ "title": "lost" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["outcome"], "failed");
        assert!(body["tasks"].as_array().unwrap().is_empty());

        let listed: Value = client
            .get(format!("{}/api/tasks", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed["lastFailure"]["operation"], "add");
        assert!(listed["lastFailure"]["at"].is_string());
        assert!(listed.get("last_failure").is_none());

        let resp = client
            .delete(format!("{}/api/failure", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::NO_CONTENT);

        let listed: Value = client
            .get(format!("{}/api/tasks", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(listed["lastFailure"].is_null());
    }

    #[tokio::test]
    async fn test_blank_title_is_skipped() {
        let store = Arc::new(MemoryTaskStore::new());
        let (base, _) = spawn_api(store.clone(), true).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{}/api/tasks", base))
            .json(&json!({ "title": "   " }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["outcome"], "skipped");
        assert_eq!(store.calls(StoreOp::Create), 0);
    }
}

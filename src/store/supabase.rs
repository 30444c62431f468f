//! Supabase client for the `tasks` collection over PostgREST.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};

use super::{StoreError, StoreResult, TaskStore};
use crate::task::{DbTask, NewDbTask, Task, TaskId};

/// Name of the remote collection.
const TASKS_TABLE: &str = "tasks";

/// Task store backed by a Supabase project.
pub struct SupabaseTaskStore {
    client: Client,
    url: String,
    api_key: String,
}

impl SupabaseTaskStore {
    /// Create a new store with a request timeout enforced by the HTTP client.
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url, api_key))
    }

    /// Create a store around an existing HTTP client.
    pub fn with_client(client: Client, url: &str, api_key: &str) -> Self {
        Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Get the PostgREST URL of the tasks table.
    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.url, TASKS_TABLE)
    }

    /// Attach the Supabase auth headers.
    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    /// Read a row array out of a response, mapping non-2xx to `Rejected`.
    async fn read_rows(resp: Response) -> StoreResult<Vec<DbTask>> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    /// Filter for the single row matching `id`.
    fn id_filter(id: &TaskId) -> [(&'static str, String); 1] {
        [("id", format!("eq.{}", id))]
    }

    /// PATCH the row matching `id` and require that one was touched.
    async fn patch(&self, id: &TaskId, updates: serde_json::Value) -> StoreResult<()> {
        let resp = self
            .authed(self.client.patch(self.table_url()))
            .query(&Self::id_filter(id))
            .header("Prefer", "return=representation")
            .json(&updates)
            .send()
            .await?;

        let rows = Self::read_rows(resp).await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl TaskStore for SupabaseTaskStore {
    async fn list_all(&self) -> StoreResult<Vec<Task>> {
        let resp = self
            .authed(self.client.get(self.table_url()))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await?;

        Self::read_rows(resp)
            .await?
            .into_iter()
            .map(Task::try_from)
            .collect()
    }

    async fn create(&self, title: &str) -> StoreResult<Task> {
        let resp = self
            .authed(self.client.post(self.table_url()))
            .header("Prefer", "return=representation")
            .json(&[NewDbTask::new(title)])
            .send()
            .await?;

        let rows = Self::read_rows(resp).await?;
        if rows.len() != 1 {
            return Err(StoreError::Decode(format!(
                "insert returned {} rows, expected 1",
                rows.len()
            )));
        }

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("No task returned".to_string()))
            .and_then(Task::try_from)
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> StoreResult<()> {
        self.patch(id, serde_json::json!({ "completed": completed }))
            .await
    }

    async fn set_title(&self, id: &TaskId, title: &str) -> StoreResult<()> {
        self.patch(id, serde_json::json!({ "title": title })).await
    }

    async fn remove(&self, id: &TaskId) -> StoreResult<()> {
        let resp = self
            .authed(self.client.delete(self.table_url()))
            .query(&Self::id_filter(id))
            .send()
            .await?;

        // A filter that matches no row is still a successful delete.
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body: resp.text().await?,
            });
        }
        Ok(())
    }
}

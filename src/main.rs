//! tasksync - HTTP front for the task synchronization controller.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tasksync::{Config, MemoryTaskStore, SupabaseTaskStore, TaskController, TaskStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasksync=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn TaskStore> = match &config.supabase {
        Some(supabase) => {
            tracing::info!("Using Supabase store at {}", supabase.url);
            Arc::new(SupabaseTaskStore::new(
                &supabase.url,
                &supabase.api_key,
                config.request_timeout,
            )?)
        }
        None => {
            tracing::warn!("SUPABASE_URL not set, tasks will only be kept in memory");
            Arc::new(MemoryTaskStore::new())
        }
    };

    let controller = Arc::new(TaskController::new(store));
    {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move {
            controller.load().await;
        });
    }

    tasksync::api::serve(config, controller).await
}

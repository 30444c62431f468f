//! Configuration management.
//!
//! Configuration is read from environment variables:
//! - `SUPABASE_URL` - Supabase project URL. When unset, tasks are kept in memory
//! - `SUPABASE_ANON_KEY` - API key sent with every request (`SUPABASE_KEY` also accepted)
//! - `TASKSYNC_HOST` - Address to bind the HTTP server (default: 127.0.0.1)
//! - `TASKSYNC_PORT` - Port for the HTTP server (default: 3000)
//! - `TASKSYNC_REQUEST_TIMEOUT_SECS` - Timeout for store requests (default: 30)

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("SUPABASE_URL is set but neither SUPABASE_ANON_KEY nor SUPABASE_KEY is")]
    MissingApiKey,

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Connection details for a Supabase project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: String,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Remote store; `None` selects the in-memory store.
    pub supabase: Option<SupabaseConfig>,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let supabase = match var("SUPABASE_URL") {
            Some(url) => {
                let api_key = var("SUPABASE_ANON_KEY")
                    .or_else(|| var("SUPABASE_KEY"))
                    .ok_or(ConfigError::MissingApiKey)?;
                Some(SupabaseConfig { url, api_key })
            }
            None => None,
        };

        let host = var("TASKSYNC_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = match var("TASKSYNC_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "TASKSYNC_PORT",
                value: raw,
            })?,
            None => 3000,
        };

        let timeout_secs: u64 = match var("TASKSYNC_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidValue {
                    name: "TASKSYNC_REQUEST_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => 30,
        };

        Ok(Self {
            supabase,
            host,
            port,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Socket address string for the HTTP server.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! Service configuration

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::sync::SyncSettings;
use crate::worker::RetryPolicy;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    pub database_max_connections: u32,
    /// JetStream server; the in-process queue is used when unset
    pub nats_url: Option<String>,
    pub port: u16,
    /// Process-wide catalog sync gate
    pub catalog_sync_enabled: bool,
    pub shopify_api_version: String,
    /// Public prefix media file paths are served under
    pub media_base_url: String,
    pub queue_max_attempts: u32,
    pub queue_backoff: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: var("DATABASE_URL").filter(|s| !s.is_empty()).ok_or(ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parsed(&var, "DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            nats_url: var("NATS_URL").filter(|s| !s.is_empty()),
            port: parsed(&var, "PORT").unwrap_or(8083),
            catalog_sync_enabled: var("CATALOG_SYNC_ENABLED").and_then(|v| parse_flag(&v)).unwrap_or(true),
            shopify_api_version: var("SHOPIFY_API_VERSION").unwrap_or_else(|| "2024-10".into()),
            media_base_url: var("MEDIA_BASE_URL")
                .unwrap_or_else(|| "http://localhost:8083/storage".into())
                .trim_end_matches('/')
                .to_string(),
            queue_max_attempts: parsed(&var, "QUEUE_MAX_ATTEMPTS").filter(|n: &u32| *n > 0).unwrap_or(3),
            queue_backoff: Duration::from_secs(parsed(&var, "QUEUE_BACKOFF_SECS").unwrap_or(10)),
        })
    }

    pub fn sync_settings(&self) -> SyncSettings { SyncSettings::new(self.catalog_sync_enabled) }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy { max_attempts: self.queue_max_attempts, backoff: self.queue_backoff }
    }
}

fn parsed<T: FromStr>(var: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    var(name).and_then(|v| v.trim().parse().ok())
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

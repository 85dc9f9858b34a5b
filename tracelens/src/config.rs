//! Configuration for the TraceLens SDK

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{LensError, LensResult};

/// SDK configuration
///
/// Unset fields fall back to the defaults below. The `api_key`,
/// `project_name`, and `environment` defaults read the `TRACELENS_API_KEY`,
/// `TRACELENS_PROJECT_NAME`, and `TRACELENS_ENVIRONMENT` environment
/// variables, so an explicitly supplied value always wins over the
/// environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LensConfig {
    /// API key sent with every batch
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Project label attached to the configuration
    #[serde(default = "default_project_name")]
    pub project_name: String,

    /// Deployment environment label
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Collection backend base URL
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Whether the SDK emits and sends events at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Buffer length that triggers an immediate flush
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Timer-triggered flush interval in milliseconds
    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,

    /// Hard cap on buffered events; reaching it forces a flush
    #[serde(default = "default_max_queue_size")]
    pub max_queue_size: usize,

    /// Payload keys whose values are replaced with a redaction marker
    #[serde(default = "default_redact_keys")]
    pub redact_keys: Vec<String>,

    /// Per-request transport timeout in milliseconds
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

fn default_api_key() -> String {
    std::env::var("TRACELENS_API_KEY").unwrap_or_default()
}

fn default_project_name() -> String {
    std::env::var("TRACELENS_PROJECT_NAME").unwrap_or_else(|_| "unnamed-project".to_string())
}

fn default_environment() -> String {
    std::env::var("TRACELENS_ENVIRONMENT").unwrap_or_else(|_| "development".to_string())
}

fn default_server_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_true() -> bool {
    true
}

fn default_batch_size() -> usize {
    10
}

fn default_flush_interval() -> u64 {
    1000
}

fn default_max_queue_size() -> usize {
    100
}

fn default_redact_keys() -> Vec<String> {
    vec![
        "password".to_string(),
        "token".to_string(),
        "secret".to_string(),
    ]
}

fn default_timeout() -> u64 {
    30000
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            project_name: default_project_name(),
            environment: default_environment(),
            server_url: default_server_url(),
            enabled: true,
            batch_size: 10,
            flush_interval_ms: 1000,
            max_queue_size: 100,
            redact_keys: default_redact_keys(),
            timeout_ms: 30000,
        }
    }
}

impl LensConfig {
    /// Create a configuration with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set the project name
    pub fn project_name(mut self, project_name: impl Into<String>) -> Self {
        self.project_name = project_name.into();
        self
    }

    /// Set the environment label
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Set the backend base URL
    pub fn server_url(mut self, server_url: impl Into<String>) -> Self {
        self.server_url = server_url.into();
        self
    }

    /// Enable or disable the SDK
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the size-trigger threshold
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the timer-trigger interval in milliseconds
    pub fn flush_interval_ms(mut self, flush_interval_ms: u64) -> Self {
        self.flush_interval_ms = flush_interval_ms;
        self
    }

    /// Set the buffer cap
    pub fn max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Replace the set of redacted keys
    pub fn redact_keys(mut self, redact_keys: Vec<String>) -> Self {
        self.redact_keys = redact_keys;
        self
    }

    /// Set the per-request transport timeout in milliseconds
    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Holder of the single active configuration
///
/// `init` installs a new generation wholesale; readers that already took a
/// snapshot keep the generation they saw. Nothing here validates field
/// ranges.
pub struct ConfigStore {
    active: RwLock<Option<Arc<LensConfig>>>,
}

impl ConfigStore {
    /// Create an uninitialized store
    pub fn new() -> Self {
        Self {
            active: RwLock::new(None),
        }
    }

    /// Install a configuration, replacing any previous one
    pub async fn init(&self, config: LensConfig) {
        *self.active.write().await = Some(Arc::new(config));
    }

    /// Get the active configuration
    pub async fn get(&self) -> LensResult<Arc<LensConfig>> {
        self.active
            .read()
            .await
            .clone()
            .ok_or(LensError::NotInitialized)
    }

    /// Non-failing variant of `get` for the emit path
    pub async fn snapshot(&self) -> Option<Arc<LensConfig>> {
        self.active.read().await.clone()
    }

    /// Whether `init` has been called
    pub async fn is_initialized(&self) -> bool {
        self.active.read().await.is_some()
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = LensConfig::new("key-123");

        assert_eq!(config.api_key, "key-123");
        assert_eq!(config.server_url, "http://localhost:3001");
        assert!(config.enabled);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.flush_interval_ms, 1000);
        assert_eq!(config.max_queue_size, 100);
        assert_eq!(config.redact_keys, vec!["password", "token", "secret"]);
        assert_eq!(config.timeout_ms, 30000);
    }

    #[test]
    fn test_builder() {
        let config = LensConfig::new("key-123")
            .project_name("checkout")
            .environment("staging")
            .server_url("https://collect.example.com")
            .batch_size(5)
            .flush_interval_ms(250)
            .max_queue_size(50)
            .redact_keys(vec!["ssn".to_string()])
            .enabled(false);

        assert_eq!(config.project_name, "checkout");
        assert_eq!(config.environment, "staging");
        assert_eq!(config.server_url, "https://collect.example.com");
        assert_eq!(config.batch_size, 5);
        assert_eq!(config.flush_interval_ms, 250);
        assert_eq!(config.max_queue_size, 50);
        assert_eq!(config.redact_keys, vec!["ssn"]);
        assert!(!config.enabled);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: LensConfig = serde_json::from_str(r#"{"api_key": "k"}"#).unwrap();

        assert_eq!(config.api_key, "k");
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.flush_interval_ms, 1000);
        assert!(config.enabled);
    }

    #[tokio::test]
    async fn test_store_starts_uninitialized() {
        let store = ConfigStore::new();

        assert!(!store.is_initialized().await);
        assert!(store.snapshot().await.is_none());
        assert!(matches!(
            store.get().await,
            Err(LensError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn test_store_init_and_get() {
        let store = ConfigStore::new();
        store.init(LensConfig::new("key-123")).await;

        assert!(store.is_initialized().await);
        let config = store.get().await.unwrap();
        assert_eq!(config.api_key, "key-123");
    }

    #[tokio::test]
    async fn test_reinit_replaces_whole_config() {
        let store = ConfigStore::new();
        store.init(LensConfig::new("first").batch_size(3)).await;
        store.init(LensConfig::new("second")).await;

        let config = store.get().await.unwrap();
        assert_eq!(config.api_key, "second");
        // Second generation carries its own defaults, not the first's overrides
        assert_eq!(config.batch_size, 10);
    }
}

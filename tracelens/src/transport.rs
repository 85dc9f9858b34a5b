//! Transport backends for batch delivery

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::config::ConfigStore;
use crate::error::{LensError, LensResult};
use crate::event::DebugEvent;

/// Header carrying the API key credential
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Transport backend interface
///
/// `send` delivers one batch. Implementations report failure through the
/// returned error; the queue absorbs it, so a transport never needs to
/// worry about crashing the host.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Backend name
    fn name(&self) -> &str;

    /// Deliver a batch of events
    async fn send(&self, events: &[DebugEvent]) -> LensResult<()>;
}

/// HTTP transport posting JSON batches to the collection backend
///
/// One POST per flush to `{server_url}/api/events`, no retry. A batch that
/// fails to deliver is dropped.
pub struct HttpTransport {
    http: reqwest::Client,
    config: Arc<ConfigStore>,
}

impl HttpTransport {
    /// Create a transport reading connection settings from the store
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self {
            http: reqwest::Client::builder().build().unwrap_or_default(),
            config,
        }
    }

    /// Create a transport with a caller-provided client
    pub fn with_client(config: Arc<ConfigStore>, http: reqwest::Client) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "http"
    }

    async fn send(&self, events: &[DebugEvent]) -> LensResult<()> {
        let config = self.config.get().await?;
        if !config.enabled {
            return Ok(());
        }

        let url = format!("{}/api/events", config.server_url);
        let response = self
            .http
            .post(&url)
            .timeout(Duration::from_millis(config.timeout_ms))
            .header(API_KEY_HEADER, config.api_key.as_str())
            .json(events)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LensError::Status(response.status()));
        }

        Ok(())
    }
}

/// In-memory transport for tests
///
/// Clones share the same storage, so a test can keep a handle after moving
/// the transport into the SDK. `set_failing` injects delivery failures.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    batches: Arc<Mutex<Vec<Vec<DebugEvent>>>>,
    fail_sends: Arc<AtomicBool>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.fail_sends.store(failing, Ordering::SeqCst);
    }

    /// All delivered batches, in order
    pub fn batches(&self) -> Vec<Vec<DebugEvent>> {
        self.batches.lock().unwrap().clone()
    }

    /// Number of delivered batches
    pub fn batch_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }

    /// All delivered events, flattened in order
    pub fn events(&self) -> Vec<DebugEvent> {
        self.batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Number of delivered events
    pub fn event_count(&self) -> usize {
        self.batches.lock().unwrap().iter().map(Vec::len).sum()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send(&self, events: &[DebugEvent]) -> LensResult<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(LensError::Transport("injected send failure".to_string()));
        }

        let mut batches = self
            .batches
            .lock()
            .map_err(|e| LensError::Transport(e.to_string()))?;
        batches.push(events.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LensConfig;
    use crate::event::EventType;

    #[tokio::test]
    async fn test_memory_transport_records_batches() {
        let transport = MemoryTransport::new();
        let shared = transport.clone();

        let batch = vec![
            DebugEvent::new("s", EventType::ConsoleLog),
            DebugEvent::new("s", EventType::ConsoleLog),
        ];
        transport.send(&batch).await.unwrap();

        assert_eq!(shared.batch_count(), 1);
        assert_eq!(shared.event_count(), 2);
    }

    #[tokio::test]
    async fn test_memory_transport_failure_injection() {
        let transport = MemoryTransport::new();
        transport.set_failing(true);

        let batch = vec![DebugEvent::new("s", EventType::ConsoleLog)];
        let result = transport.send(&batch).await;

        assert!(matches!(result, Err(LensError::Transport(_))));
        assert_eq!(transport.batch_count(), 0);

        transport.set_failing(false);
        transport.send(&batch).await.unwrap();
        assert_eq!(transport.batch_count(), 1);
    }

    #[tokio::test]
    async fn test_http_transport_disabled_is_noop() {
        let store = Arc::new(ConfigStore::new());
        store.init(LensConfig::new("key").enabled(false)).await;
        let transport = HttpTransport::new(store);

        // Disabled short-circuits before any network activity
        let batch = vec![DebugEvent::new("s", EventType::ConsoleLog)];
        transport.send(&batch).await.unwrap();
    }

    #[tokio::test]
    async fn test_http_transport_requires_init() {
        let transport = HttpTransport::new(Arc::new(ConfigStore::new()));

        let result = transport.send(&[]).await;
        assert!(matches!(result, Err(LensError::NotInitialized)));
    }

    #[test]
    fn test_backend_names() {
        let store = Arc::new(ConfigStore::new());
        assert_eq!(HttpTransport::new(store).name(), "http");
        assert_eq!(MemoryTransport::new().name(), "memory");
    }
}

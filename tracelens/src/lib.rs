//! TraceLens - client-side tracing SDK
//!
//! TraceLens turns function calls, log lines, and HTTP activity inside a
//! host application into structured debug events and ships them to a
//! collection backend, batched and strictly best-effort: a slow or dead
//! backend costs the host nothing but dropped telemetry.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      TRACELENS                           │
//! │                                                          │
//! │  trace()/log() ──► ┌─────────────┐   ┌───────────────┐   │
//! │                    │  Session    │   │   Config      │   │
//! │                    │  Registry   │   │   Store       │   │
//! │                    └──────┬──────┘   └───────┬───────┘   │
//! │                           │                  │           │
//! │                    ┌──────▼──────────────────▼───────┐   │
//! │                    │   Serializer (redact, bound)    │   │
//! │                    └──────────────┬──────────────────┘   │
//! │                                   │                      │
//! │                    ┌──────────────▼──────────────────┐   │
//! │                    │   Event Queue (batch + timer)   │   │
//! │                    └──────────────┬──────────────────┘   │
//! │                                   │                      │
//! │                    ┌──────────────▼──────────────────┐   │
//! │                    │   Transport (HTTP POST batch)   │   │
//! │                    └─────────────────────────────────┘   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tracelens::LensConfig;
//!
//! // Initialize the process-wide instance
//! tracelens::init(LensConfig::new("api-key-123")).await;
//!
//! // Correlate an operation into enter/exit events
//! let user = tracelens::trace("load_user", || async {
//!     db.load_user(42).await
//! }).await?;
//!
//! // Structured log line
//! tracelens::log("cache warm", Some(serde_json::json!({"entries": 1024}))).await;
//!
//! // Ship whatever is still buffered
//! tracelens::flush().await;
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod queue;
pub mod serializer;
pub mod session;
pub mod transport;

pub use config::{ConfigStore, LensConfig};
pub use error::{LensError, LensResult};
pub use event::{DebugEvent, ErrorInfo, EventType, SourceLocation};
pub use queue::{EventQueue, FlushResult, QueueStats};
pub use serializer::{
    sanitize, to_safe_value, CIRCULAR_MARKER, REDACTED_MARKER, UNSERIALIZABLE_MARKER,
};
pub use session::SessionRegistry;
pub use transport::{HttpTransport, MemoryTransport, Transport};

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// The trace correlation engine
///
/// Owns the config store, session registry, and event queue, and exposes
/// the public instrumentation surface. Every operation is a no-op while
/// the SDK is uninitialized or disabled, and nothing that goes wrong
/// inside the pipeline ever propagates to the caller.
pub struct TraceLens {
    /// Active configuration
    config: Arc<ConfigStore>,

    /// Current session identity
    session: SessionRegistry,

    /// Batching queue, owns the transport
    queue: Arc<EventQueue>,
}

impl TraceLens {
    /// Create an uninitialized instance with the HTTP transport
    pub fn new() -> Self {
        let config = Arc::new(ConfigStore::new());
        let transport = Arc::new(HttpTransport::new(Arc::clone(&config)));
        Self::assemble(config, transport)
    }

    /// Create an instance with a custom transport
    pub fn with_transport<T: Transport + Send + Sync + 'static>(transport: T) -> Self {
        Self::assemble(Arc::new(ConfigStore::new()), Arc::new(transport))
    }

    fn assemble(config: Arc<ConfigStore>, transport: Arc<dyn Transport>) -> Self {
        let queue = Arc::new(EventQueue::new(Arc::clone(&config), transport));
        Self {
            config,
            session: SessionRegistry::new(),
            queue,
        }
    }

    /// Install a configuration, replacing any previous one
    pub async fn init(&self, config: LensConfig) {
        self.config.init(config).await;
        self.log("SDK Initialized", None).await;
    }

    /// Whether `init` has been called
    pub async fn is_initialized(&self) -> bool {
        self.config.is_initialized().await
    }

    /// Get the active configuration
    pub async fn config(&self) -> LensResult<Arc<LensConfig>> {
        self.config.get().await
    }

    /// Emit a console_log event
    ///
    /// `data` is sanitized and lands both as the event's metadata (merged
    /// with the message) and as a compact JSON string in `arguments`.
    pub async fn log(&self, message: &str, data: Option<Value>) {
        let config = match self.config.snapshot().await {
            Some(config) if config.enabled => config,
            _ => return,
        };

        let session_id = self.session.current().await;
        let mut event = DebugEvent::new(session_id, EventType::ConsoleLog).with_name(message);

        let mut metadata = Map::new();
        metadata.insert("message".to_string(), Value::String(message.to_string()));

        if let Some(data) = data {
            let sanitized = sanitize(&data, &config.redact_keys);
            if let Value::Object(fields) = &sanitized {
                for (key, value) in fields {
                    metadata.insert(key.clone(), value.clone());
                }
            }
            event = event.with_arguments(Value::String(sanitized.to_string()));
        }

        let _ = self
            .queue
            .add_event(event.with_metadata(Value::Object(metadata)))
            .await;
    }

    /// Emit a console_log event carrying caller source location
    ///
    /// The call site resolves its own location; this only attaches it.
    /// `args` are sanitized and additionally formatted into a joined
    /// human-readable string.
    pub async fn log_with_location(&self, message: &str, args: &[Value], location: SourceLocation) {
        let config = match self.config.snapshot().await {
            Some(config) if config.enabled => config,
            _ => return,
        };

        let session_id = self.session.current().await;

        let sanitized: Vec<Value> = args
            .iter()
            .map(|arg| sanitize(arg, &config.redact_keys))
            .collect();

        let formatted = sanitized
            .iter()
            .map(|arg| match arg {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");

        let data = Value::Array(sanitized);

        let name = match &location.function_name {
            Some(function_name) => format!("{}()", function_name),
            None => message.to_string(),
        };

        let arguments = json!({
            "message": message,
            "data": data.clone(),
            "formatted": formatted,
        });

        let event = DebugEvent::new(session_id, EventType::ConsoleLog)
            .with_name(name)
            .with_location(location)
            .with_arguments(Value::String(arguments.to_string()))
            .with_metadata(json!({ "message": message, "data": data }));

        let _ = self.queue.add_event(event).await;
    }

    /// Run an async operation bracketed by enter/exit events
    ///
    /// Emits function_enter, awaits `op`, then emits function_exit with the
    /// sanitized return value or function_error with the failure, both
    /// linked back through `parent_event_id` and carrying the elapsed
    /// milliseconds. The operation's own result is always returned
    /// unchanged, and `op` still runs when the SDK is off.
    pub async fn trace<F, Fut, T, E>(&self, name: &str, op: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Display,
    {
        let config = match self.config.snapshot().await {
            Some(config) if config.enabled => config,
            _ => return op().await,
        };

        let session_id = self.session.current().await;
        let enter =
            DebugEvent::new(session_id.clone(), EventType::FunctionEnter).with_function_name(name);
        let enter_id = enter.id.clone();
        let start = Instant::now();

        let _ = self.queue.add_event(enter).await;

        match op().await {
            Ok(value) => {
                let exit = DebugEvent::new(session_id, EventType::FunctionExit)
                    .with_function_name(name)
                    .with_parent(enter_id)
                    .with_duration(start.elapsed().as_millis() as u64)
                    .with_return_value(to_safe_value(&value, &config.redact_keys));
                let _ = self.queue.add_event(exit).await;
                Ok(value)
            }
            Err(error) => {
                let failure = DebugEvent::new(session_id, EventType::FunctionError)
                    .with_function_name(name)
                    .with_parent(enter_id)
                    .with_duration(start.elapsed().as_millis() as u64)
                    .with_error(ErrorInfo::capture(error.to_string()));
                let _ = self.queue.add_event(failure).await;
                Err(error)
            }
        }
    }

    /// Start a new session, superseding any current one
    ///
    /// Emits a session_start event carrying the sanitized metadata and
    /// returns the new id.
    pub async fn start_session(&self, metadata: Option<Value>) -> String {
        let session_id = self.session.start().await;

        if let Some(config) = self.config.snapshot().await {
            if config.enabled {
                let mut event = DebugEvent::new(session_id.clone(), EventType::SessionStart);
                if let Some(metadata) = metadata {
                    event = event.with_metadata(sanitize(&metadata, &config.redact_keys));
                }
                let _ = self.queue.add_event(event).await;
            }
        }

        session_id
    }

    /// End the current session
    ///
    /// Emits a session_end event, flushes the queue so the session's tail
    /// is not stranded in the buffer, then clears the session id. The next
    /// access creates a fresh session.
    pub async fn end_session(&self) {
        if let Some(session_id) = self.session.active().await {
            if let Some(config) = self.config.snapshot().await {
                if config.enabled {
                    let event = DebugEvent::new(session_id, EventType::SessionEnd);
                    let _ = self.queue.add_event(event).await;
                }
            }
            self.queue.flush().await;
        }

        self.session.end().await;
    }

    /// Get the current session id, creating one if none exists
    pub async fn current_session(&self) -> String {
        self.session.current().await
    }

    /// Flush all buffered events to the transport
    pub async fn flush(&self) -> FlushResult {
        self.queue.flush().await
    }

    /// Get queue statistics
    pub async fn queue_stats(&self) -> QueueStats {
        self.queue.stats().await
    }
}

impl Default for TraceLens {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide default instance
static GLOBAL: Lazy<Arc<TraceLens>> = Lazy::new(|| Arc::new(TraceLens::new()));

/// Get the process-wide instance
pub fn global() -> Arc<TraceLens> {
    Arc::clone(&GLOBAL)
}

/// Initialize the process-wide instance
pub async fn init(config: LensConfig) {
    GLOBAL.init(config).await;
}

/// Whether the process-wide instance has been initialized
pub async fn is_initialized() -> bool {
    GLOBAL.is_initialized().await
}

/// Emit a console_log event through the process-wide instance
pub async fn log(message: &str, data: Option<Value>) {
    GLOBAL.log(message, data).await;
}

/// Emit a located console_log event through the process-wide instance
pub async fn log_with_location(message: &str, args: &[Value], location: SourceLocation) {
    GLOBAL.log_with_location(message, args, location).await;
}

/// Trace an operation through the process-wide instance
pub async fn trace<F, Fut, T, E>(name: &str, op: F) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: Serialize,
    E: Display,
{
    GLOBAL.trace(name, op).await
}

/// Start a session on the process-wide instance
pub async fn start_session(metadata: Option<Value>) -> String {
    GLOBAL.start_session(metadata).await
}

/// End the current session on the process-wide instance
pub async fn end_session() {
    GLOBAL.end_session().await;
}

/// Current session id of the process-wide instance
pub async fn current_session() -> String {
    GLOBAL.current_session().await
}

/// Flush the process-wide instance
pub async fn flush() -> FlushResult {
    GLOBAL.flush().await
}

/// Queue statistics of the process-wide instance
pub async fn queue_stats() -> QueueStats {
    GLOBAL.queue_stats().await
}

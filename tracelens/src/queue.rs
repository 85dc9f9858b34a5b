//! Batching event queue with size- and time-triggered flush

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::config::ConfigStore;
use crate::error::LensResult;
use crate::event::DebugEvent;
use crate::transport::Transport;

/// Queue statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    /// Number of events currently buffered
    pub pending_count: usize,

    /// Total events accepted
    pub total_enqueued: u64,

    /// Total events handed to the transport
    pub total_flushed: u64,

    /// Number of flush operations
    pub flush_count: u64,

    /// Last flush time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_flush_at: Option<DateTime<Utc>>,
}

/// Result of a flush operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlushResult {
    /// Number of events in the flushed batch
    pub flushed_count: usize,

    /// Whether the transport accepted the batch
    pub success: bool,
}

/// Buffers events and decides when to hand a batch to the transport
///
/// Two triggers converge on `flush`: buffer length reaching `batch_size`
/// (or the `max_queue_size` cap, which therefore bounds memory), and
/// `flush_interval_ms` elapsing on an armed timer. At most one timer is
/// armed at a time. A batch is taken from the buffer with a swap, so the
/// live buffer restarts empty and the snapshot is never mutated again.
pub struct EventQueue {
    /// Configuration source
    config: Arc<ConfigStore>,

    /// Delivery backend
    transport: Arc<dyn Transport>,

    /// Pending events
    events: RwLock<Vec<DebugEvent>>,

    /// Armed flush timer, if any
    timer: Mutex<Option<JoinHandle<()>>>,

    /// Statistics
    total_enqueued: AtomicU64,
    total_flushed: AtomicU64,
    flush_count: AtomicU64,
    last_flush_at: RwLock<Option<DateTime<Utc>>>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new(config: Arc<ConfigStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            events: RwLock::new(Vec::new()),
            timer: Mutex::new(None),
            total_enqueued: AtomicU64::new(0),
            total_flushed: AtomicU64::new(0),
            flush_count: AtomicU64::new(0),
            last_flush_at: RwLock::new(None),
        }
    }

    /// Append an event and apply the flush triggers
    ///
    /// Fails with `NotInitialized` before `init`; nothing is buffered in
    /// that case. Reaching `max_queue_size` flushes immediately even when
    /// `batch_size` is larger, so the buffer never outgrows the cap.
    pub async fn add_event(self: &Arc<Self>, event: DebugEvent) -> LensResult<()> {
        let config = self.config.get().await?;

        let pending = {
            let mut events = self.events.write().await;
            events.push(event);
            self.total_enqueued.fetch_add(1, Ordering::SeqCst);
            events.len()
        };

        if pending >= config.batch_size || pending >= config.max_queue_size {
            self.flush().await;
        } else {
            self.arm_timer(config.flush_interval_ms).await;
        }

        Ok(())
    }

    /// Flush all pending events to the transport
    ///
    /// Empty buffer is a no-op. Delivery failure is logged and the batch is
    /// dropped; it never propagates to the caller.
    pub async fn flush(&self) -> FlushResult {
        if self.events.read().await.is_empty() {
            return FlushResult {
                flushed_count: 0,
                success: true,
            };
        }

        self.disarm_timer().await;

        let events: Vec<DebugEvent> = {
            let mut queue = self.events.write().await;
            std::mem::take(&mut *queue)
        };

        if events.is_empty() {
            // A racing flush took the batch between the check and the swap
            return FlushResult {
                flushed_count: 0,
                success: true,
            };
        }

        let count = events.len();
        let success = match self.transport.send(&events).await {
            Ok(()) => {
                tracing::debug!(count, transport = self.transport.name(), "Flushed debug events");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, count, "Failed to send debug events");
                false
            }
        };

        self.total_flushed.fetch_add(count as u64, Ordering::SeqCst);
        self.flush_count.fetch_add(1, Ordering::SeqCst);
        *self.last_flush_at.write().await = Some(Utc::now());

        FlushResult {
            flushed_count: count,
            success,
        }
    }

    /// Arm the flush timer unless one is already armed
    async fn arm_timer(self: &Arc<Self>, interval_ms: u64) {
        let mut timer = self.timer.lock().await;
        if timer.is_some() {
            return;
        }

        let queue = Arc::clone(self);
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(interval_ms)).await;
            // Drop our own handle before flushing so the disarm inside
            // flush cannot abort the task that is performing it
            queue.timer.lock().await.take();
            queue.flush().await;
        }));
    }

    /// Cancel any armed timer
    async fn disarm_timer(&self) {
        if let Some(handle) = self.timer.lock().await.take() {
            handle.abort();
        }
    }

    /// Get queue statistics
    pub async fn stats(&self) -> QueueStats {
        let pending_count = self.events.read().await.len();
        let last_flush_at = *self.last_flush_at.read().await;

        QueueStats {
            pending_count,
            total_enqueued: self.total_enqueued.load(Ordering::SeqCst),
            total_flushed: self.total_flushed.load(Ordering::SeqCst),
            flush_count: self.flush_count.load(Ordering::SeqCst),
            last_flush_at,
        }
    }

    /// Get pending event count
    pub async fn pending_count(&self) -> usize {
        self.events.read().await.len()
    }

    /// Check if the buffer is empty
    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

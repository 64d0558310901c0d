//! # Event Bus
//!
//! Publish/subscribe channel from the POS session to whoever renders it.
//!
//! ## Event Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   PosSession / SaleSubmitter                                            │
//! │          │ publish(PosEvent)                                            │
//! │          ▼                                                              │
//! │   ┌──────────────┐    unbounded mpsc per subscriber                     │
//! │   │   EventBus   │──────────────┬──────────────────┐                    │
//! │   └──────────────┘              ▼                  ▼                    │
//! │                          Subscription #1     Subscription #2            │
//! │                          (cart widget)       (toast layer)              │
//! │                                                                         │
//! │   • Dropping a Subscription unsubscribes it                             │
//! │   • close() ends every stream (recv() → None)                           │
//! │   • Subscribers whose receiver is gone are pruned on publish            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tally_core::{SaleReceipt, Totals};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

// =============================================================================
// Events
// =============================================================================

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// A user-facing message. Presentation is up to the subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Notice {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Info, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }
}

/// Everything the session publishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PosEvent {
    /// Fresh totals after any cart change.
    CartChanged(Totals),
    /// A sale the backend confirmed.
    SaleCompleted(SaleReceipt),
    Notice(Notice),
}

// =============================================================================
// Bus
// =============================================================================

type Sender = mpsc::UnboundedSender<PosEvent>;

#[derive(Debug, Default)]
struct BusInner {
    subscribers: Mutex<Vec<(u64, Sender)>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

impl BusInner {
    fn subscribers(&self) -> MutexGuard<'_, Vec<(u64, Sender)>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, id: u64) {
        self.subscribers().retain(|(sub_id, _)| *sub_id != id);
    }
}

/// Cloneable handle to one session's event channel.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber.
    ///
    /// Subscribing to a closed bus yields a stream that is already finished.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        // Checked under the lock so close() cannot race a late subscriber in.
        let mut subscribers = self.inner.subscribers();
        if !self.inner.closed.load(Ordering::Acquire) {
            subscribers.push((id, tx));
        }
        drop(subscribers);

        debug!(subscriber_id = id, "Event subscriber added");
        Subscription {
            id,
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Delivers an event to every live subscriber. Returns how many got it.
    pub fn publish(&self, event: PosEvent) -> usize {
        let mut subscribers = self.inner.subscribers();
        subscribers.retain(|(_, tx)| tx.send(event.clone()).is_ok());
        subscribers.len()
    }

    /// Shorthand for publishing a notice.
    pub fn notify(&self, notice: Notice) -> usize {
        self.publish(PosEvent::Notice(notice))
    }

    /// Ends every subscription. Later publishes reach nobody.
    pub fn close(&self) {
        let mut subscribers = self.inner.subscribers();
        self.inner.closed.store(true, Ordering::Release);
        let dropped = subscribers.len();
        subscribers.clear();
        debug!(dropped, "Event bus closed");
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().len()
    }
}

// =============================================================================
// Subscription
// =============================================================================

/// Receiving end of the bus. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<PosEvent>,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Waits for the next event. `None` once the bus is closed and drained.
    pub async fn recv(&mut self) -> Option<PosEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<PosEvent> {
        self.rx.try_recv().ok()
    }

    /// Explicit unsubscribe. Same as dropping.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
            debug!(subscriber_id = self.id, "Event subscriber removed");
        }
    }
}

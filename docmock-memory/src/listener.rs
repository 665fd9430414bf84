//! Store-wide change listeners.
//!
//! Notification is coarse: every successful write wakes every
//! registered listener after a short delay, whatever path changed. Listeners
//! re-read their own query or document when woken.

use futures::future::BoxFuture;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tracing::{trace, warn};

use docmock_core::backend::{ListenerCallback, ListenerId};

/// Default delay between a write and listener delivery.
pub const DEFAULT_NOTIFICATION_DELAY: Duration = Duration::from_millis(10);

/// Registered listeners and the delivery policy.
pub(crate) struct ListenerRegistry {
    enabled: bool,
    delay: Duration,
    next_id: AtomicU64,
    listeners: Mutex<IndexMap<ListenerId, ListenerCallback>>,
}

impl ListenerRegistry {
    pub fn new(enabled: bool, delay: Duration) -> Self {
        Self {
            enabled,
            delay,
            next_id: AtomicU64::new(0),
            listeners: Mutex::new(IndexMap::new()),
        }
    }

    /// Registers a listener, or returns `None` when change delivery is disabled.
    pub fn add(&self, listener: ListenerCallback) -> Option<ListenerId> {
        if !self.enabled {
            return None;
        }

        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().insert(id, listener);
        trace!(listener = id.0, "Registered snapshot listener");

        Some(id)
    }

    pub fn remove(&self, id: ListenerId) {
        if self.listeners.lock().shift_remove(&id).is_some() {
            trace!(listener = id.0, "Removed snapshot listener");
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Schedules delivery to every listener registered right now.
    pub fn notify(&self) {
        let listeners = self
            .listeners
            .lock()
            .values()
            .cloned()
            .collect::<Vec<_>>();

        if listeners.is_empty() {
            return;
        }

        trace!(listeners = listeners.len(), "Scheduling change notification");

        self.defer(Box::pin(async move {
            for listener in listeners {
                (*listener)().await;
            }
        }));
    }

    /// Runs `task` on the current tokio runtime after the notification delay.
    pub fn defer(&self, task: BoxFuture<'static, ()>) {
        if tokio::runtime::Handle::try_current().is_err() {
            warn!("No tokio runtime available, dropping snapshot delivery");
            return;
        }

        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new(false, DEFAULT_NOTIFICATION_DELAY)
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("enabled", &self.enabled)
            .field("delay", &self.delay)
            .field("listeners", &self.len())
            .finish()
    }
}

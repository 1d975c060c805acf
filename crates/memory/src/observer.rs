//! History-change notifications.
//!
//! The store keeps at most one listener; registering a new one replaces the
//! old. Listeners are never run inside the mutating call: they are spawned on
//! the ambient tokio runtime, or on a detached thread when there is none. A
//! listener that wants to touch the store again must go through
//! [`SharedMemoryStore`](crate::SharedMemoryStore), which it will only be able
//! to lock once the mutation that triggered it has returned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Published every time the history is mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryChanged {
    /// History length after the mutation.
    pub history_len: usize,
    pub timestamp: DateTime<Utc>,
}

impl HistoryChanged {
    pub fn now(history_len: usize) -> Self {
        Self {
            history_len,
            timestamp: Utc::now(),
        }
    }
}

/// A history-change listener.
pub type HistoryCallback = Arc<dyn Fn(HistoryChanged) + Send + Sync>;

/// Holds the single registered listener and dispatches to it.
#[derive(Clone, Default)]
pub struct HistoryObserver {
    callback: Option<HistoryCallback>,
}

impl HistoryObserver {
    /// Register `callback`, replacing any previous listener.
    pub fn set(&mut self, callback: HistoryCallback) {
        self.callback = Some(callback);
    }

    pub fn clear(&mut self) {
        self.callback = None;
    }

    pub fn is_set(&self) -> bool {
        self.callback.is_some()
    }

    /// Dispatch `event` to the listener, if any. Returns immediately.
    pub fn notify(&self, event: HistoryChanged) {
        let Some(callback) = self.callback.clone() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move { callback(event) });
            }
            Err(_) => {
                std::thread::spawn(move || callback(event));
            }
        }
    }
}

impl std::fmt::Debug for HistoryObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryObserver")
            .field("callback", &self.callback.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn forward_to(tx: mpsc::UnboundedSender<HistoryChanged>) -> HistoryCallback {
        Arc::new(move |event| {
            let _ = tx.send(event);
        })
    }

    #[tokio::test]
    async fn dispatch_is_deferred() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut observer = HistoryObserver::default();
        observer.set(forward_to(tx));

        observer.notify(HistoryChanged::now(3));
        // Single-threaded runtime: the spawned listener has not run yet.
        assert!(rx.try_recv().is_err());

        let event = rx.recv().await.unwrap();
        assert_eq!(event.history_len, 3);
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        let mut observer = HistoryObserver::default();
        observer.set(forward_to(tx_a));
        observer.set(forward_to(tx_b));

        observer.notify(HistoryChanged::now(1));

        assert_eq!(rx_b.recv().await.unwrap().history_len, 1);
        // The replaced listener (and its sender) is gone.
        assert!(rx_a.recv().await.is_none());
    }

    #[tokio::test]
    async fn no_listener_is_a_noop() {
        let mut observer = HistoryObserver::default();
        assert!(!observer.is_set());
        observer.notify(HistoryChanged::now(0));

        let (tx, mut rx) = mpsc::unbounded_channel();
        observer.set(forward_to(tx));
        observer.clear();
        observer.notify(HistoryChanged::now(0));
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn dispatches_on_a_thread_without_runtime() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut observer = HistoryObserver::default();
        observer.set(Arc::new(move |event: HistoryChanged| {
            let _ = tx.send(event.history_len);
        }));

        observer.notify(HistoryChanged::now(7));
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
    }
}

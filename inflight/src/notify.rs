//! Pending-set change notification.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use inflight_core::RequestConfig;
use tokio::sync::watch;

use crate::pending::PendingChange;

/// Outbound configs of every pending dispatch, in dispatch order.
pub type PendingSnapshot = Vec<Arc<RequestConfig>>;

/// Callback invoked with the pending snapshot whenever it changes.
///
/// Runs synchronously after the orchestrator's state is unlocked, so it may
/// read [`pending`](crate::Orchestrator::pending) or
/// [`pending_len`](crate::Orchestrator::pending_len). Calls are serialized and
/// a snapshot older than one already delivered is skipped. It must not issue
/// requests or trigger a replay.
pub type PendingListener = Arc<dyn Fn(&[Arc<RequestConfig>]) + Send + Sync>;

/// Fans pending snapshots out to the registered callback and to
/// [`watch`] subscribers.
pub(crate) struct ChangeNotifier {
    listener: Option<PendingListener>,
    sender: watch::Sender<PendingSnapshot>,
    /// Revision of the last delivered change.
    delivered: Mutex<u64>,
}

impl ChangeNotifier {
    pub(crate) fn new(listener: Option<PendingListener>) -> Self {
        let (sender, _) = watch::channel(PendingSnapshot::new());
        Self {
            listener,
            sender,
            delivered: Mutex::new(0),
        }
    }

    /// Delivers `change` unless a newer one already went out.
    pub(crate) fn notify(&self, change: PendingChange) {
        let mut delivered = self.delivered.lock().unwrap_or_else(PoisonError::into_inner);
        if change.revision <= *delivered {
            tracing::trace!(revision = change.revision, "stale pending snapshot skipped");
            return;
        }
        *delivered = change.revision;

        let snapshot = change.snapshot;
        crate::metrics::record_pending(snapshot.len());
        if let Some(listener) = &self.listener {
            listener(&snapshot);
        }
        self.sender.send_replace(snapshot);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<PendingSnapshot> {
        self.sender.subscribe()
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listener", &self.listener.as_ref().map(|_| "..."))
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(revision: u64, urls: &[&str]) -> PendingChange {
        PendingChange {
            revision,
            snapshot: urls
                .iter()
                .map(|url| Arc::new(RequestConfig::get(*url)))
                .collect(),
        }
    }

    #[test]
    fn test_stale_changes_are_skipped() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let notifier = ChangeNotifier::new(Some(Arc::new(move |snapshot: &[Arc<RequestConfig>]| {
            recorder.lock().unwrap().push(snapshot.len());
        })));
        let receiver = notifier.subscribe();

        notifier.notify(change(2, &["/a", "/b"]));
        notifier.notify(change(1, &["/a"]));
        notifier.notify(change(3, &[]));

        assert_eq!(*seen.lock().unwrap(), vec![2, 0]);
        assert!(receiver.borrow().is_empty());
    }
}

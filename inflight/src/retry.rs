//! Retry queue.
//!
//! Holds the outbound configs of dispatches whose outcome the retry predicate
//! accepted. Nothing leaves the queue until the host calls
//! [`Orchestrator::replay`](crate::Orchestrator::replay).

use std::collections::BTreeMap;
use std::sync::Arc;

use inflight_core::RequestConfig;

use crate::pending::DispatchId;

/// Dispatch id → config awaiting replay.
///
/// Keyed by dispatch id, so queuing the same dispatch twice keeps one entry.
#[derive(Debug, Default)]
pub struct RetryQueue {
    queued: BTreeMap<DispatchId, Arc<RequestConfig>>,
}

impl RetryQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `config` for dispatch `id`. Returns `false` if it was already queued.
    pub fn enqueue(&mut self, id: DispatchId, config: Arc<RequestConfig>) -> bool {
        self.queued.insert(id, config).is_none()
    }

    /// Takes every queued entry, in dispatch order, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<(DispatchId, Arc<RequestConfig>)> {
        std::mem::take(&mut self.queued).into_iter().collect()
    }

    /// Returns `true` if dispatch `id` is queued.
    pub fn contains(&self, id: DispatchId) -> bool {
        self.queued.contains_key(&id)
    }

    /// Returns the number of queued entries.
    pub fn len(&self) -> usize {
        self.queued.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}

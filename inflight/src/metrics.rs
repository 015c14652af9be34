//! Metrics declaration and recording.
//!
//! With the `metrics` feature disabled every `record_*` function is an empty
//! inline function.

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of requests answered from the response cache.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "inflight_cache_hit_total",
            "Total number of requests answered from the response cache."
        );
        "inflight_cache_hit_total"
    };
    /// Track number of requests attached to an in-flight dispatch.
    pub static ref COALESCED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "inflight_coalesced_total",
            "Total number of requests attached to an already in-flight dispatch."
        );
        "inflight_coalesced_total"
    };
    /// Track number of new dispatches.
    pub static ref DISPATCH_COUNTER: &'static str = {
        metrics::describe_counter!(
            "inflight_dispatch_total",
            "Total number of new dispatches registered."
        );
        "inflight_dispatch_total"
    };
    /// Track number of outcomes parked in the retry queue.
    pub static ref RETRY_QUEUED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "inflight_retry_queued_total",
            "Total number of outcomes parked in the retry queue."
        );
        "inflight_retry_queued_total"
    };
    /// Track number of replayed transport calls.
    pub static ref REPLAY_COUNTER: &'static str = {
        metrics::describe_counter!(
            "inflight_replay_total",
            "Total number of transport calls made by retry replay."
        );
        "inflight_replay_total"
    };
    /// Track number of settled dispatches by outcome.
    pub static ref SETTLED_COUNTER: &'static str = {
        metrics::describe_counter!(
            "inflight_settled_total",
            "Total number of dispatches settled, labelled by outcome."
        );
        "inflight_settled_total"
    };
    /// Gauge of currently pending dispatches.
    pub static ref PENDING_GAUGE: &'static str = {
        metrics::describe_gauge!(
            "inflight_pending",
            "Number of dispatches currently pending."
        );
        "inflight_pending"
    };
}

/// Record a request answered from the cache.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_cache_hit() {
    metrics::counter!(*CACHE_HIT_COUNTER).increment(1);
}

/// Record a request attached to an in-flight dispatch.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_coalesced() {
    metrics::counter!(*COALESCED_COUNTER).increment(1);
}

/// Record a new dispatch.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_dispatch() {
    metrics::counter!(*DISPATCH_COUNTER).increment(1);
}

/// Record an outcome parked in the retry queue.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_retry_queued() {
    metrics::counter!(*RETRY_QUEUED_COUNTER).increment(1);
}

/// Record `count` replayed transport calls.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_replay(count: usize) {
    metrics::counter!(*REPLAY_COUNTER).increment(count as u64);
}

/// Record a settled dispatch. `outcome` is `"success"` or `"error"`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_settled(outcome: &'static str) {
    metrics::counter!(*SETTLED_COUNTER, "outcome" => outcome).increment(1);
}

/// Record the current pending count.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_pending(len: usize) {
    metrics::gauge!(*PENDING_GAUGE).set(len as f64);
}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_cache_hit() {}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_coalesced() {}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_dispatch() {}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_retry_queued() {}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_replay(_count: usize) {}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_settled(_outcome: &'static str) {}

/// No-op without the `metrics` feature.
#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_pending(_len: usize) {}

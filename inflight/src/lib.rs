#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Typestate builder for [`Orchestrator`].
pub mod builder;

/// Coalescing registry: one in-flight dispatch per fingerprint.
///
/// A new dispatch registers its shared outcome here before the transport is
/// called, so an equivalent request issued right after attaches to it instead
/// of reaching the network. Entries outlive retryable outcomes and are only
/// released when the dispatch settles.
pub mod coalesce;

/// Orchestrator configuration, loadable with serde.
pub mod config;

/// Error type returned by request futures.
///
/// Defines [`Error`] which covers:
/// - Transport failures not accepted by the retry predicate
/// - Requests that could not be fingerprinted
/// - Dispatches dropped before they settled
pub mod error;

/// The future returned for every request, and where its outcome comes from.
pub mod future;

/// Metrics collection for orchestrator observability.
///
/// When the `metrics` feature is enabled, this module provides counters for
/// cache hits, coalesced requests, dispatches, retry queue activity and
/// settled dispatches, plus a gauge of pending dispatches.
pub mod metrics;

/// Pending-list change notification types.
pub mod notify;

/// Per-call request options.
pub mod options;

/// The request orchestrator.
pub mod orchestrator;

/// Pending request table and dispatch ids.
pub mod pending;

/// Retry queue for manual replay.
pub mod retry;

pub use builder::{NotSet, OrchestratorBuilder};
pub use config::{Config, ConfigBuilder, TimestampConfig};
pub use error::Error;
pub use future::{ResponseFuture, ResponseSource};
pub use notify::{PendingListener, PendingSnapshot};
pub use options::RequestOptions;
pub use orchestrator::Orchestrator;
pub use pending::DispatchId;

pub use inflight_core::{
    CacheHandle, CanonicalFingerprinter, Fingerprint, FingerprintConfig, FingerprintError,
    Fingerprinter, InvalidateFn, MultipartField, RequestBody, RequestConfig, Response,
    ResponseCache, Transport, TransportError, TransportErrorKind, predicate,
};

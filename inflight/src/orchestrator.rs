//! The request orchestrator.
//!
//! # Request path
//!
//! [`Orchestrator::send`] decides synchronously, before returning, how a
//! request is served:
//!
//! 1. compute the fingerprint; an unresolvable URL rejects immediately
//! 2. if the request opted into caching and the cache has an entry, return it
//! 3. if coalescing applies and an equivalent dispatch is in flight, attach to it
//! 4. otherwise register a new dispatch, spawn the transport call and notify
//!    listeners once the state is unlocked
//!
//! # Outcome path
//!
//! When the transport call finishes:
//!
//! 1. an outcome accepted by the retry predicate is parked in the retry queue;
//!    waiters keep waiting and the coalescing entry stays live
//! 2. otherwise the dispatch settles: an accepted success is cached (if
//!    requested) and triggers the request's invalidation callback, then the
//!    coalescing entry is released, every waiter receives the outcome and
//!    listeners are notified
//!
//! A transport that panics settles its dispatch with a
//! [`TransportErrorKind::Other`] error, as does a dispatch started outside a
//! tokio runtime. Predicates and callbacks run without the state lock held.
//!
//! [`Orchestrator::replay`] sends every parked config again under its original
//! dispatch id, so the replay's outcome settles the callers that have been
//! waiting since the first attempt.

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use futures::FutureExt;
use http::Method;
use inflight_core::{
    BoxPredicate, Fingerprint, FingerprintError, Fingerprinter, RequestConfig, Response,
    ResponseCache, Transport, TransportError, TransportErrorKind,
};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::builder::{NotSet, OrchestratorBuilder};
use crate::coalesce::CoalescingRegistry;
use crate::config::Config;
use crate::error::Error;
use crate::future::{ResponseFuture, ResponseSource};
use crate::metrics;
use crate::notify::{ChangeNotifier, PendingSnapshot};
use crate::options::RequestOptions;
use crate::pending::{DispatchContext, DispatchId, PendingTable};
use crate::retry::RetryQueue;

/// Caching, coalescing, retrying front for a [`Transport`].
///
/// Cloning is cheap; clones share all state.
///
/// Every dispatch runs on its own task spawned onto the current tokio
/// runtime. Outside a runtime, a request that needs a dispatch fails with a
/// [`TransportErrorKind::Other`] error.
pub struct Orchestrator<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Orchestrator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    pending: PendingTable,
    coalescing: CoalescingRegistry,
    retry: RetryQueue,
}

pub(crate) struct Inner<T> {
    transport: T,
    config: Config,
    fingerprinter: Box<dyn Fingerprinter>,
    success: BoxPredicate<Response>,
    retry: BoxPredicate<Response>,
    cache: ResponseCache,
    notifier: ChangeNotifier,
    state: Mutex<State>,
}

impl Orchestrator<NotSet> {
    /// Creates a new [`OrchestratorBuilder`].
    pub fn builder() -> OrchestratorBuilder<NotSet> {
        OrchestratorBuilder::new()
    }
}

impl<T: Transport> Orchestrator<T> {
    /// Creates an orchestrator with default predicates and fingerprinting.
    pub fn new(transport: T, config: Config) -> Self {
        Orchestrator::builder()
            .transport(transport)
            .config(config)
            .build()
    }

    pub(crate) fn from_parts(
        transport: T,
        config: Config,
        fingerprinter: Box<dyn Fingerprinter>,
        success: BoxPredicate<Response>,
        retry: BoxPredicate<Response>,
        notifier: ChangeNotifier,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                fingerprinter,
                success,
                retry,
                cache: ResponseCache::new(),
                notifier,
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Sends `config` with default options: no caching, coalescing on.
    pub fn request(&self, config: RequestConfig) -> ResponseFuture {
        self.send(config, RequestOptions::default())
    }

    /// Sends a `GET` request for `url` with default options.
    pub fn get(&self, url: impl Into<String>) -> ResponseFuture {
        self.request(RequestConfig::get(url))
    }

    /// Sends `config`.
    ///
    /// All bookkeeping happens before this function returns: a second
    /// equivalent request sent right after this one is guaranteed to see this
    /// one's dispatch. The transport call itself runs on a spawned task and
    /// completes even if the returned future is dropped.
    pub fn send(&self, config: RequestConfig, options: RequestOptions) -> ResponseFuture {
        let config = self.inner.with_defaults(config);
        let fingerprint = match self.inner.fingerprinter.fingerprint(&config) {
            Ok(fingerprint) => fingerprint,
            Err(error) => {
                warn!(url = %config.url, %error, "request rejected before dispatch");
                return ResponseFuture::ready(Err(error.into()), ResponseSource::Rejected);
            }
        };
        let use_cache = self.inner.config.cache && options.cache;
        let coalesce = self.inner.config.coalesce && !options.no_coalesce;

        let mut state = self.inner.lock();

        if use_cache && let Some(hit) = self.inner.cache.get(&fingerprint) {
            debug!(%fingerprint, "cache hit");
            metrics::record_cache_hit();
            return ResponseFuture::ready(Ok(hit), ResponseSource::Cache);
        }

        if coalesce && let Some((id, outcome)) = state.coalescing.attach(&fingerprint) {
            debug!(%fingerprint, dispatch_id = %id, "attached to in-flight dispatch");
            metrics::record_coalesced();
            return ResponseFuture::shared(outcome, ResponseSource::Coalesced(id));
        }

        let outbound = Arc::new(self.inner.stamp(config));
        let context = DispatchContext {
            fingerprint: fingerprint.clone(),
            options,
            coalesced: coalesce,
            attempt: 1,
        };
        let (id, outcome) = match state.pending.register(Arc::clone(&outbound), context) {
            Ok(registered) => registered,
            Err(error) => {
                error!(%fingerprint, %error, "request rejected before dispatch");
                return ResponseFuture::ready(Err(error), ResponseSource::Rejected);
            }
        };
        if coalesce {
            state
                .coalescing
                .register(fingerprint.clone(), id, outcome.clone());
        }
        debug!(%fingerprint, dispatch_id = %id, coalesce, "new dispatch");
        metrics::record_dispatch();
        let change = state.pending.change();
        drop(state);

        self.inner.notifier.notify(change);
        Inner::dispatch(&self.inner, id, 1, outbound);
        ResponseFuture::shared(outcome, ResponseSource::Dispatched(id))
    }

    /// Sends every config in the retry queue again and empties the queue.
    ///
    /// Each replay reuses its original dispatch: its outcome settles the
    /// callers that have been waiting since the first attempt, and the
    /// pending list does not change. Returns the number of configs sent.
    pub fn replay(&self) -> usize {
        let mut state = self.inner.lock();
        let mut replays = Vec::new();
        for (id, config) in state.retry.drain() {
            match state.pending.get_mut(id) {
                Some(record) => {
                    record.context.attempt += 1;
                    replays.push((id, record.context.attempt, config));
                }
                None => debug!(dispatch_id = %id, "queued dispatch no longer pending"),
            }
        }
        drop(state);

        let count = replays.len();
        if count > 0 {
            info!(count, "replaying retry queue");
            metrics::record_replay(count);
        }
        for (id, attempt, config) in replays {
            Inner::dispatch(&self.inner, id, attempt, config);
        }
        count
    }
}

impl<T> Orchestrator<T> {
    /// Returns the outbound configs of every pending dispatch, in dispatch order.
    pub fn pending(&self) -> PendingSnapshot {
        self.inner.lock().pending.snapshot()
    }

    /// Returns the number of pending dispatches.
    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Returns the number of configs waiting for [`replay`](Self::replay).
    pub fn retry_queue_len(&self) -> usize {
        self.inner.lock().retry.len()
    }

    /// Subscribes to pending-list changes.
    ///
    /// The receiver always holds the latest snapshot; intermediate snapshots
    /// may be skipped by slow subscribers.
    pub fn subscribe(&self) -> watch::Receiver<PendingSnapshot> {
        self.inner.notifier.subscribe()
    }

    /// Returns the response cache.
    pub fn cache(&self) -> &ResponseCache {
        &self.inner.cache
    }

    /// Returns the configuration.
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Computes the fingerprint `send` would use for `config`.
    pub fn fingerprint(&self, config: &RequestConfig) -> Result<Fingerprint, FingerprintError> {
        let config = self.inner.with_defaults(config.clone());
        self.inner.fingerprinter.fingerprint(&config)
    }
}

impl<T> fmt::Debug for Orchestrator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("Orchestrator")
            .field("config", &self.inner.config)
            .field("cache", &self.inner.cache)
            .field("pending", &state.pending.len())
            .field("coalescing", &state.coalescing.len())
            .field("retry_queue", &state.retry.len())
            .finish_non_exhaustive()
    }
}

impl<T> Inner<T> {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_defaults(&self, mut config: RequestConfig) -> RequestConfig {
        if config.base_url.is_none() {
            config.base_url.clone_from(&self.config.base_url);
        }
        config
    }

    fn stamp(&self, mut config: RequestConfig) -> RequestConfig {
        if let Some(timestamp) = &self.config.timestamp
            && config.method == Method::GET
        {
            config.params.insert(
                timestamp.param.clone(),
                Utc::now().timestamp_millis().to_string(),
            );
        }
        config
    }

    fn is_retryable(&self, outcome: &Result<Response, TransportError>) -> bool {
        if !self.config.retry {
            return false;
        }
        match outcome {
            Ok(response) => self.retry.check(response),
            Err(error) => error
                .response()
                .is_some_and(|response| self.retry.check(response)),
        }
    }

    fn accept(&self, response: Response, context: &DispatchContext) -> Response {
        if !self.success.check(&response) {
            debug!(status = %response.status, "response rejected by success predicate");
            return response;
        }
        let mut response = response;
        if self.config.cache && context.options.cache {
            let fingerprint = context.fingerprint.clone();
            self.cache.put(fingerprint.clone(), response.clone());
            response = response.with_cache_handle(self.cache.handle(fingerprint));
        }
        if let Some(invalidate) = &context.options.invalidate {
            invalidate(&self.cache);
        }
        response
    }

    fn complete(&self, id: DispatchId, outcome: Result<Response, TransportError>) {
        let retryable = self.is_retryable(&outcome);

        let mut state = self.lock();
        let Some(record) = state.pending.get(id) else {
            debug!(dispatch_id = %id, "outcome for unknown dispatch ignored");
            return;
        };
        let context = record.context.clone();
        if retryable {
            let config = Arc::clone(&record.config);
            if state.retry.enqueue(id, config) {
                metrics::record_retry_queued();
            }
            warn!(
                dispatch_id = %id,
                fingerprint = %context.fingerprint,
                attempt = context.attempt,
                "retryable outcome queued for replay"
            );
            return;
        }
        drop(state);

        // Not parked, so no other task can settle `id` meanwhile.
        let outcome = match outcome {
            Ok(response) => Ok(self.accept(response, &context)),
            Err(error) => Err(Error::Transport(error)),
        };
        let label = if outcome.is_ok() { "success" } else { "error" };

        let mut state = self.lock();
        if context.coalesced {
            state.coalescing.release(&context.fingerprint, id);
        }
        if !state.pending.settle(id, outcome) {
            return;
        }
        let change = state.pending.change();
        drop(state);

        debug!(dispatch_id = %id, attempt = context.attempt, outcome = label, "dispatch settled");
        metrics::record_settled(label);
        self.notifier.notify(change);
    }
}

impl<T: Transport> Inner<T> {
    fn dispatch(inner: &Arc<Self>, id: DispatchId, attempt: u32, config: Arc<RequestConfig>) {
        let span = info_span!(
            "inflight.dispatch",
            dispatch_id = id.get(),
            attempt,
            method = %config.method,
            url = %config.url,
        );
        let Ok(runtime) = Handle::try_current() else {
            let _entered = span.enter();
            error!("no tokio runtime to dispatch on");
            let error = TransportError::new(TransportErrorKind::Other, "no tokio runtime")
                .with_config(RequestConfig::clone(&config));
            inner.complete(id, Err(error));
            return;
        };
        let inner = Arc::clone(inner);
        runtime.spawn(
            async move {
                let call = AssertUnwindSafe(async {
                    inner.transport.send(RequestConfig::clone(&config)).await
                });
                let outcome = call.catch_unwind().await.unwrap_or_else(|_| {
                    error!("transport panicked");
                    Err(
                        TransportError::new(TransportErrorKind::Other, "transport panicked")
                            .with_config(RequestConfig::clone(&config)),
                    )
                });
                inner.complete(id, outcome);
            }
            .instrument(span),
        );
    }
}

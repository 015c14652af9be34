//! Per-call request options.

use std::fmt;
use std::sync::Arc;

use inflight_core::{InvalidateFn, ResponseCache};

/// Options that travel beside a [`RequestConfig`](inflight_core::RequestConfig).
///
/// ```
/// use inflight::RequestOptions;
///
/// let options = RequestOptions::new()
///     .cache(true)
///     .on_success_invalidate(|cache| cache.clear());
/// assert!(options.cache);
/// ```
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Read from and write to the response cache.
    pub cache: bool,
    /// Never merge this request with a concurrent equivalent one.
    pub no_coalesce: bool,
    /// Called with the whole cache on every terminal success of this request.
    pub invalidate: Option<InvalidateFn>,
}

impl RequestOptions {
    /// Options with caching off and coalescing on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opt into the response cache.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.cache = enabled;
        self
    }

    /// Opt out of coalescing.
    pub fn no_coalesce(mut self, disabled: bool) -> Self {
        self.no_coalesce = disabled;
        self
    }

    /// Run `invalidate` against the cache whenever this request succeeds.
    ///
    /// It runs before waiters are woken, with the orchestrator unlocked, and
    /// must not issue requests.
    pub fn on_success_invalidate<F>(mut self, invalidate: F) -> Self
    where
        F: Fn(&ResponseCache) + Send + Sync + 'static,
    {
        self.invalidate = Some(Arc::new(invalidate));
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("cache", &self.cache)
            .field("no_coalesce", &self.no_coalesce)
            .field("invalidate", &self.invalidate.as_ref().map(|_| "..."))
            .finish()
    }
}

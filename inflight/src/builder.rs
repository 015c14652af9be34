//! Typestate builder for [`Orchestrator`].

use std::fmt;
use std::sync::Arc;

use inflight_core::predicate::{Predicate, ServerError, SuccessStatus};
use inflight_core::{
    BoxPredicate, CanonicalFingerprinter, Fingerprinter, RequestConfig, Response, Transport,
};

use crate::config::Config;
use crate::notify::{ChangeNotifier, PendingListener};
use crate::orchestrator::Orchestrator;

/// Marker type for unset builder fields.
///
/// When you see `NotSet` in a compiler error, it means you haven't called
/// [`OrchestratorBuilder::transport`] yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotSet;

/// Builder for [`Orchestrator`].
///
/// Use [`Orchestrator::builder()`] to create a new builder.
///
/// ```
/// use inflight::{Config, Orchestrator};
/// use inflight::predicate::{PredicateExt, ServerError, StatusCodes};
/// # use inflight::{RequestConfig, Response, Transport, TransportError};
/// # struct Client;
/// # impl Transport for Client {
/// #     type Future = std::future::Ready<Result<Response, TransportError>>;
/// #     fn send(&self, request: RequestConfig) -> Self::Future {
/// #         std::future::ready(Ok(Response::new(http::StatusCode::OK, request)))
/// #     }
/// # }
///
/// let orchestrator = Orchestrator::builder()
///     .transport(Client)
///     .config(Config::builder().retry(true).timestamp("_t").build())
///     .retry_predicate(ServerError.or(StatusCodes::new([http::StatusCode::TOO_MANY_REQUESTS])))
///     .on_pending_change(|pending| println!("{} requests in flight", pending.len()))
///     .build();
/// assert_eq!(orchestrator.pending_len(), 0);
/// ```
pub struct OrchestratorBuilder<T> {
    transport: T,
    config: Config,
    fingerprinter: Option<Box<dyn Fingerprinter>>,
    success: Option<BoxPredicate<Response>>,
    retry: Option<BoxPredicate<Response>>,
    listener: Option<PendingListener>,
}

impl OrchestratorBuilder<NotSet> {
    /// Creates a new builder with default configuration and no transport.
    pub fn new() -> Self {
        Self {
            transport: NotSet,
            config: Config::default(),
            fingerprinter: None,
            success: None,
            retry: None,
            listener: None,
        }
    }
}

impl Default for OrchestratorBuilder<NotSet> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrchestratorBuilder<T> {
    /// Sets the transport.
    pub fn transport<NewT: Transport>(self, transport: NewT) -> OrchestratorBuilder<NewT> {
        OrchestratorBuilder {
            transport,
            config: self.config,
            fingerprinter: self.fingerprinter,
            success: self.success,
            retry: self.retry,
            listener: self.listener,
        }
    }

    /// Sets the configuration.
    pub fn config(self, config: Config) -> Self {
        Self { config, ..self }
    }

    /// Replaces the fingerprint strategy.
    ///
    /// A custom fingerprinter does not see [`Config::excluded_params`] or the
    /// timestamp parameter; it has to ignore them itself.
    pub fn fingerprinter(self, fingerprinter: impl Fingerprinter + 'static) -> Self {
        Self {
            fingerprinter: Some(Box::new(fingerprinter)),
            ..self
        }
    }

    /// Decides which transport successes are cached and trigger invalidation
    /// callbacks. Defaults to [`SuccessStatus`].
    pub fn success_predicate(
        self,
        predicate: impl Predicate<Subject = Response> + 'static,
    ) -> Self {
        Self {
            success: Some(Box::new(predicate)),
            ..self
        }
    }

    /// Decides which outcomes are parked for replay when
    /// [`Config::retry`] is on. Defaults to [`ServerError`].
    ///
    /// Errors without a response are never retryable.
    pub fn retry_predicate(self, predicate: impl Predicate<Subject = Response> + 'static) -> Self {
        Self {
            retry: Some(Box::new(predicate)),
            ..self
        }
    }

    /// Registers a callback invoked with the pending list after every change.
    ///
    /// See [`PendingListener`] for what the callback may do.
    pub fn on_pending_change<F>(self, listener: F) -> Self
    where
        F: Fn(&[Arc<RequestConfig>]) + Send + Sync + 'static,
    {
        Self {
            listener: Some(Arc::new(listener)),
            ..self
        }
    }
}

impl<T: Transport> OrchestratorBuilder<T> {
    /// Builds the orchestrator.
    pub fn build(self) -> Orchestrator<T> {
        let fingerprinter = self.fingerprinter.unwrap_or_else(|| {
            Box::new(CanonicalFingerprinter::new(self.config.fingerprint_config()))
        });
        Orchestrator::from_parts(
            self.transport,
            self.config,
            fingerprinter,
            self.success.unwrap_or_else(|| Box::new(SuccessStatus)),
            self.retry.unwrap_or_else(|| Box::new(ServerError)),
            ChangeNotifier::new(self.listener),
        )
    }
}

impl<T> fmt::Debug for OrchestratorBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrchestratorBuilder")
            .field("config", &self.config)
            .field("fingerprinter", &self.fingerprinter.as_ref().map(|_| "..."))
            .field("success", &self.success.as_ref().map(|_| "..."))
            .field("retry", &self.retry.as_ref().map(|_| "..."))
            .field("listener", &self.listener.as_ref().map(|_| "..."))
            .finish()
    }
}

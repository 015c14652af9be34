//! The transport contract.

use std::future::Future;
use std::sync::Arc;

use crate::error::TransportError;
use crate::request::RequestConfig;
use crate::response::Response;

/// The component that actually performs HTTP requests.
///
/// Implementations own wire encoding: they turn a structured
/// [`RequestConfig`] into bytes, send it, and report either a [`Response`] or
/// a [`TransportError`]. Non-success statuses should be reported as
/// [`TransportError::status`] so retry predicates can see the response.
///
/// The returned future is spawned, so it must be `Send + 'static`.
///
/// # Examples
///
/// ```
/// use std::future::Ready;
///
/// use http::StatusCode;
/// use inflight_core::{RequestConfig, Response, Transport, TransportError};
///
/// struct Echo;
///
/// impl Transport for Echo {
///     type Future = Ready<Result<Response, TransportError>>;
///
///     fn send(&self, request: RequestConfig) -> Self::Future {
///         let body = request.url.clone();
///         std::future::ready(Ok(Response::new(StatusCode::OK, request).with_data(body)))
///     }
/// }
/// ```
pub trait Transport: Send + Sync + 'static {
    /// The future that resolves to the outcome.
    type Future: Future<Output = Result<Response, TransportError>> + Send + 'static;

    /// Sends `request`.
    fn send(&self, request: RequestConfig) -> Self::Future;
}

impl<T> Transport for Arc<T>
where
    T: Transport,
{
    type Future = T::Future;

    fn send(&self, request: RequestConfig) -> Self::Future {
        self.as_ref().send(request)
    }
}

//! The future returned by [`Orchestrator::send`](crate::Orchestrator::send).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::{self, Ready};
use pin_project::pin_project;

use crate::pending::{DispatchId, Outcome, SharedOutcome};

/// Where a request's outcome comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    /// Served from the response cache without touching the transport.
    Cache,
    /// Attached to an already in-flight dispatch.
    Coalesced(DispatchId),
    /// Started a new dispatch.
    Dispatched(DispatchId),
    /// Rejected before dispatch, e.g. an invalid URL.
    Rejected,
}

impl ResponseSource {
    /// Returns the dispatch this request waits on, if any.
    pub fn dispatch_id(&self) -> Option<DispatchId> {
        match self {
            ResponseSource::Coalesced(id) | ResponseSource::Dispatched(id) => Some(*id),
            ResponseSource::Cache | ResponseSource::Rejected => None,
        }
    }
}

#[pin_project(project = StateProj)]
enum State {
    Ready(#[pin] Ready<Outcome>),
    Shared(#[pin] SharedOutcome),
}

/// Resolves to the outcome of one request.
///
/// Dropping it does not cancel the dispatch: the transport call runs to
/// completion and still updates the cache and the pending table.
#[pin_project]
#[must_use = "futures do nothing unless polled"]
pub struct ResponseFuture {
    source: ResponseSource,
    #[pin]
    state: State,
}

impl ResponseFuture {
    pub(crate) fn ready(outcome: Outcome, source: ResponseSource) -> Self {
        Self {
            source,
            state: State::Ready(future::ready(outcome)),
        }
    }

    pub(crate) fn shared(outcome: SharedOutcome, source: ResponseSource) -> Self {
        Self {
            source,
            state: State::Shared(outcome),
        }
    }

    /// Returns how this request was served.
    pub fn source(&self) -> ResponseSource {
        self.source
    }
}

impl Future for ResponseFuture {
    type Output = Outcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match self.project().state.project() {
            StateProj::Ready(ready) => ready.poll(cx),
            StateProj::Shared(shared) => shared.poll(cx),
        }
    }
}

impl std::fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

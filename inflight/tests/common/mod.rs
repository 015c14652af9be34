//! Test transport whose calls are answered by hand.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use http::StatusCode;
use inflight::{RequestConfig, Response, Transport, TransportError, TransportErrorKind};
use tokio::sync::{mpsc, oneshot};

pub const BASE_URL: &str = "https://apigateway.example.com";

/// A transport call waiting for a test to answer it.
#[derive(Debug)]
pub struct PendingCall {
    pub config: RequestConfig,
    responder: oneshot::Sender<Result<Response, TransportError>>,
}

impl PendingCall {
    pub fn respond(self, outcome: Result<Response, TransportError>) {
        let _ = self.responder.send(outcome);
    }

    pub fn ok(self, body: &'static str) {
        let response = Response::new(StatusCode::OK, self.config.clone()).with_data(body);
        self.respond(Ok(response));
    }

    pub fn fail(self, status: u16) {
        let status = StatusCode::from_u16(status).unwrap();
        let response = Response::new(status, self.config.clone());
        self.respond(Err(TransportError::status(response)));
    }

    pub fn network_error(self) {
        let error = TransportError::new(TransportErrorKind::Connect, "connection refused")
            .with_config(self.config.clone());
        self.respond(Err(error));
    }
}

#[derive(Debug, Clone)]
pub struct MockTransport {
    calls: mpsc::UnboundedSender<PendingCall>,
    count: Arc<AtomicUsize>,
}

impl MockTransport {
    pub fn new() -> (Self, Calls) {
        let (calls, receiver) = mpsc::unbounded_channel();
        let count = Arc::new(AtomicUsize::new(0));
        let transport = Self {
            calls,
            count: Arc::clone(&count),
        };
        (transport, Calls { receiver, count })
    }
}

impl Transport for MockTransport {
    type Future = BoxFuture<'static, Result<Response, TransportError>>;

    fn send(&self, request: RequestConfig) -> Self::Future {
        self.count.fetch_add(1, Ordering::SeqCst);
        let (responder, outcome) = oneshot::channel();
        let _ = self.calls.send(PendingCall {
            config: request,
            responder,
        });
        async move {
            outcome.await.unwrap_or_else(|_| {
                Err(TransportError::new(TransportErrorKind::Other, "mock call dropped"))
            })
        }
        .boxed()
    }
}

/// The receiving side of a [`MockTransport`].
pub struct Calls {
    receiver: mpsc::UnboundedReceiver<PendingCall>,
    count: Arc<AtomicUsize>,
}

impl Calls {
    /// Waits for the next transport call.
    pub async fn next(&mut self) -> PendingCall {
        tokio::time::timeout(Duration::from_secs(5), self.receiver.recv())
            .await
            .expect("timed out waiting for a transport call")
            .expect("transport dropped")
    }

    /// Lets spawned tasks run, then asserts no call is waiting.
    pub async fn assert_idle(&mut self) {
        settle().await;
        assert!(
            self.receiver.try_recv().is_err(),
            "unexpected transport call"
        );
    }

    /// Total number of transport calls made so far.
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Yields until spawned tasks have had a chance to run.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Polls `condition` until it holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

pub fn user_request() -> RequestConfig {
    RequestConfig::get("/user")
        .base_url(BASE_URL)
        .param("platform", "MTDS")
}

//! [`Transport`] implementation backed by `reqwest-middleware`.

use futures::FutureExt;
use futures::future::BoxFuture;
use inflight_core::{RequestConfig, Response, Transport, TransportError, TransportErrorKind};
use reqwest_middleware::{ClientWithMiddleware, RequestBuilder};
use tracing::{debug, trace};

use crate::encode::{Encoded, encode_body};

/// Sends [`RequestConfig`]s with a reqwest client.
///
/// Any middleware stack built with [`reqwest_middleware::ClientBuilder`]
/// runs underneath, so tracing, auth or retry middleware still apply to
/// every dispatch.
///
/// Responses with a non-2xx status are reported as
/// [`TransportErrorKind::Status`] errors carrying the full response.
///
/// ```no_run
/// use inflight::{Config, Orchestrator};
/// use inflight_reqwest::ReqwestTransport;
///
/// # async fn run() -> Result<(), inflight::Error> {
/// let orchestrator = Orchestrator::new(
///     ReqwestTransport::new(reqwest::Client::new()),
///     Config::builder().base_url("https://api.example.com").build(),
/// );
/// let user = orchestrator.get("/user").await?;
/// println!("{}", user.text());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ClientWithMiddleware,
}

impl ReqwestTransport {
    /// Wraps a plain [`reqwest::Client`] or a middleware client.
    pub fn new(client: impl Into<ClientWithMiddleware>) -> Self {
        Self {
            client: client.into(),
        }
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }

    fn build(&self, config: &RequestConfig) -> Result<RequestBuilder, TransportError> {
        let url = config
            .full_url()
            .map_err(|error| TransportError::new(TransportErrorKind::Request, error.to_string()))?;
        let mut headers = config.headers.clone();
        let body = encode_body(&config.body, &mut headers)?;

        let builder = self
            .client
            .request(config.method.clone(), url)
            .headers(headers);
        Ok(match body {
            Encoded::None => builder,
            Encoded::Bytes(bytes) => builder.body(bytes),
            Encoded::Multipart(form) => builder.multipart(form),
        })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl From<reqwest::Client> for ReqwestTransport {
    fn from(client: reqwest::Client) -> Self {
        Self::new(client)
    }
}

impl From<ClientWithMiddleware> for ReqwestTransport {
    fn from(client: ClientWithMiddleware) -> Self {
        Self::new(client)
    }
}

impl Transport for ReqwestTransport {
    type Future = BoxFuture<'static, Result<Response, TransportError>>;

    fn send(&self, config: RequestConfig) -> Self::Future {
        let builder = self.build(&config);
        async move {
            let builder = builder.map_err(|error| error.with_config(config.clone()))?;
            debug!(method = %config.method, url = %config.url, "sending request");

            let response = match builder.send().await {
                Ok(response) => response,
                Err(error) => return Err(from_middleware_error(error).with_config(config)),
            };
            let status = response.status();
            let headers = response.headers().clone();
            let data = match response.bytes().await {
                Ok(data) => data,
                Err(error) => return Err(from_reqwest_error(&error).with_config(config)),
            };
            trace!(%status, len = data.len(), "response received");

            let response = Response::new(status, config)
                .with_headers(headers)
                .with_data(data);
            if response.is_success() {
                Ok(response)
            } else {
                Err(TransportError::status(response))
            }
        }
        .boxed()
    }
}

fn from_middleware_error(error: reqwest_middleware::Error) -> TransportError {
    match error {
        reqwest_middleware::Error::Reqwest(error) => from_reqwest_error(&error),
        reqwest_middleware::Error::Middleware(error) => {
            TransportError::new(TransportErrorKind::Other, error.to_string())
        }
    }
}

fn from_reqwest_error(error: &reqwest::Error) -> TransportError {
    let kind = if error.is_timeout() {
        TransportErrorKind::Timeout
    } else if error.is_connect() {
        TransportErrorKind::Connect
    } else if error.is_body() {
        TransportErrorKind::Body
    } else if error.is_decode() {
        TransportErrorKind::Decode
    } else if error.is_builder() || error.is_request() {
        TransportErrorKind::Request
    } else {
        TransportErrorKind::Other
    };
    TransportError::new(kind, error.to_string())
}

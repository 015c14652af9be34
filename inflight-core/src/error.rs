//! Error types shared by transports and the fingerprint generator.
//!
//! Both types are `Clone`: one transport outcome fans out to every caller that
//! coalesced onto the same dispatch.

use std::fmt;

use http::StatusCode;
use thiserror::Error;

use crate::request::RequestConfig;
use crate::response::Response;

/// The request could not be turned into a fingerprint.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FingerprintError {
    /// The URL could not be parsed or resolved against the base URL.
    #[error("invalid request url `{url}`: {source}")]
    InvalidUrl {
        /// The URL as written in the request.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },
    /// The canonical form could not be serialized.
    #[error("failed to serialize request fingerprint: {0}")]
    Serialize(String),
}

/// Broad category of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Connection could not be established.
    Connect,
    /// The transport gave up waiting.
    Timeout,
    /// The request could not be built or sent.
    Request,
    /// Reading the response body failed.
    Body,
    /// The response could not be decoded.
    Decode,
    /// The server answered with a non-success status.
    Status,
    /// Anything else.
    Other,
}

impl TransportErrorKind {
    /// Returns the kind as a string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransportErrorKind::Connect => "connect",
            TransportErrorKind::Timeout => "timeout",
            TransportErrorKind::Request => "request",
            TransportErrorKind::Body => "body",
            TransportErrorKind::Decode => "decode",
            TransportErrorKind::Status => "status",
            TransportErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed transport call.
///
/// May carry the (partial) response the server sent, e.g. the body of a `503`,
/// so retry predicates can inspect it.
#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    kind: TransportErrorKind,
    message: String,
    response: Option<Box<Response>>,
    config: Option<Box<RequestConfig>>,
}

impl TransportError {
    /// Creates an error of the given kind.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            response: None,
            config: None,
        }
    }

    /// Creates a [`TransportErrorKind::Status`] error from a non-success response.
    ///
    /// The request config is taken from the response's back-reference.
    pub fn status(response: Response) -> Self {
        let message = format!("request failed with status {}", response.status);
        let config = response.config.clone();
        Self::new(TransportErrorKind::Status, message)
            .with_config(config)
            .with_response(response)
    }

    /// Attaches the response the server sent.
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(Box::new(response));
        self
    }

    /// Attaches the request config that failed.
    pub fn with_config(mut self, config: RequestConfig) -> Self {
        self.config = Some(Box::new(config));
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> TransportErrorKind {
        self.kind
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the response attached to this error, if any.
    pub fn response(&self) -> Option<&Response> {
        self.response.as_deref()
    }

    /// Returns the status of the attached response, if any.
    pub fn status_code(&self) -> Option<StatusCode> {
        self.response().map(|response| response.status)
    }

    /// Returns the request config that failed, if known.
    pub fn config(&self) -> Option<&RequestConfig> {
        self.config.as_deref()
    }
}

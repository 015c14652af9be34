//! Transport responses.

use std::borrow::Cow;

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;

use crate::cache::CacheHandle;
use crate::request::RequestConfig;

/// A response produced by a [`Transport`](crate::Transport).
///
/// Carries a back-reference to the request config it satisfies. Cloning is
/// cheap for the body (`Bytes` is reference counted).
#[derive(Debug, Clone)]
pub struct Response {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub data: Bytes,
    /// The request this response answers.
    pub config: RequestConfig,
    cache_handle: Option<CacheHandle>,
}

impl Response {
    /// Creates an empty response with the given status for `config`.
    pub fn new(status: StatusCode, config: RequestConfig) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            data: Bytes::new(),
            config,
            cache_handle: None,
        }
    }

    /// Replaces the headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the body.
    pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
        self.data = data.into();
        self
    }

    /// Attaches a handle to the cache entry this response was stored under.
    pub fn with_cache_handle(mut self, handle: CacheHandle) -> Self {
        self.cache_handle = Some(handle);
        self
    }

    /// Returns `true` for `2xx` statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.data)
    }

    /// Returns the body as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    /// Returns the handle of the cache entry created for this response.
    ///
    /// Only set on responses that completed a dispatch with caching enabled;
    /// responses served from the cache never carry one.
    pub fn cache_handle(&self) -> Option<&CacheHandle> {
        self.cache_handle.as_ref()
    }

    /// Removes this response's cache entry, if it has one.
    ///
    /// Returns `true` if an entry was removed.
    pub fn invalidate_cache(&self) -> bool {
        self.cache_handle
            .as_ref()
            .is_some_and(|handle| handle.invalidate())
    }
}

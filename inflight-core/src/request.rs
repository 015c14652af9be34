//! Outbound request description.
//!
//! A [`RequestConfig`] is the logical, pre-wire view of a request: the method,
//! the URL (optionally relative to a base URL), explicit query parameters,
//! headers, and a structured [`RequestBody`]. Transports encode it to bytes;
//! the fingerprint generator reads it before any encoding happens, so two
//! requests that only differ in wire encoding share one identity.
//!
//! ```
//! use inflight_core::RequestConfig;
//!
//! let request = RequestConfig::get("/user")
//!     .base_url("https://api.example.com")
//!     .param("platform", "MTDS");
//!
//! assert_eq!(request.params.get("platform").map(String::as_str), Some("MTDS"));
//! ```

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use http::{HeaderMap, Method};
use serde_json::Value;
use url::Url;

use crate::error::FingerprintError;

/// Structured request body, before wire encoding.
///
/// Keeping the body structured is what lets a JSON payload and a form payload
/// with equal field contents fingerprint identically.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON document.
    ///
    /// Transports normally send this as `application/json`. When the request
    /// carries an explicit `application/x-www-form-urlencoded` or
    /// `multipart/form-data` content type, the document is flattened into
    /// fields instead.
    Json(Value),
    /// URL-encoded form fields, in send order. Repeated names are allowed.
    Form(Vec<(String, String)>),
    /// Multipart form fields, in send order.
    Multipart(Vec<MultipartField>),
    /// Opaque bytes with an optional content type.
    Bytes {
        /// Value for the `Content-Type` header, if any.
        content_type: Option<String>,
        /// Raw payload.
        data: Bytes,
    },
}

impl RequestBody {
    /// Returns `true` if there is no body.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }
}

/// A single multipart form field.
#[derive(Clone, PartialEq)]
pub enum MultipartField {
    /// Plain text field.
    Text {
        /// Field name.
        name: String,
        /// Field value.
        value: String,
    },
    /// File upload field.
    File {
        /// Field name.
        name: String,
        /// Client-side file name.
        file_name: Option<String>,
        /// MIME type of the file content.
        content_type: Option<String>,
        /// File content.
        data: Bytes,
    },
}

impl MultipartField {
    /// Creates a text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        MultipartField::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Creates a file field without a content type.
    pub fn file(name: impl Into<String>, file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        MultipartField::File {
            name: name.into(),
            file_name: Some(file_name.into()),
            content_type: None,
            data: data.into(),
        }
    }

    /// Returns the field name.
    pub fn name(&self) -> &str {
        match self {
            MultipartField::Text { name, .. } | MultipartField::File { name, .. } => name,
        }
    }
}

impl fmt::Debug for MultipartField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MultipartField::Text { name, value } => f
                .debug_struct("Text")
                .field("name", name)
                .field("value", value)
                .finish(),
            MultipartField::File {
                name,
                file_name,
                content_type,
                data,
            } => f
                .debug_struct("File")
                .field("name", name)
                .field("file_name", file_name)
                .field("content_type", content_type)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// Logical description of an outbound request.
///
/// `Clone` is a deep copy: every field is owned data, so a snapshot taken at
/// dispatch time cannot be affected by later changes to the caller's copy.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    /// HTTP method.
    pub method: Method,
    /// Base URL that relative [`url`](Self::url) values are resolved against.
    pub base_url: Option<String>,
    /// Absolute URL, or a URL relative to [`base_url`](Self::base_url).
    /// May carry its own query string.
    pub url: String,
    /// Explicit query parameters. Merged with the URL's own query string when
    /// the request is sent or fingerprinted; URL values win on conflict.
    pub params: BTreeMap<String, String>,
    /// Request headers. Not part of the request fingerprint.
    pub headers: HeaderMap,
    /// Structured body.
    pub body: RequestBody,
}

impl RequestConfig {
    /// Creates a request with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            base_url: None,
            url: url.into(),
            params: BTreeMap::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Creates a `GET` request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a `POST` request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Creates a `PUT` request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Creates a `PATCH` request.
    pub fn patch(url: impl Into<String>) -> Self {
        Self::new(Method::PATCH, url)
    }

    /// Creates a `DELETE` request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Adds or replaces an explicit query parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Adds or replaces a header.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, value: &'static str) -> Self {
        self.header(CONTENT_TYPE, HeaderValue::from_static(value))
    }

    /// Sets a JSON body.
    pub fn json(mut self, value: Value) -> Self {
        self.body = RequestBody::Json(value);
        self
    }

    /// Sets a URL-encoded form body.
    pub fn form<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.body = RequestBody::Form(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Sets a multipart body.
    pub fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    /// Sets a raw body.
    pub fn bytes(mut self, content_type: Option<String>, data: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes {
            content_type,
            data: data.into(),
        };
        self
    }

    /// Returns the `Content-Type` header value, if it is valid UTF-8.
    pub fn content_type_header(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// Resolves [`url`](Self::url) against [`base_url`](Self::base_url).
    ///
    /// An absolute `url` ignores the base, the same way a browser resolves
    /// links. The returned URL still carries the query string written in
    /// `url`; explicit [`params`](Self::params) are not applied.
    pub fn resolve_url(&self) -> Result<Url, FingerprintError> {
        let invalid = |source| FingerprintError::InvalidUrl {
            url: self.url.clone(),
            source,
        };
        match Url::parse(&self.url) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                let base = self
                    .base_url
                    .as_deref()
                    .ok_or(url::ParseError::RelativeUrlWithoutBase)
                    .and_then(Url::parse)
                    .map_err(invalid)?;
                base.join(&self.url).map_err(invalid)
            }
            Err(source) => Err(invalid(source)),
        }
    }

    /// Merges explicit params with the URL's query string.
    ///
    /// A name in the URL's query replaces an explicit param with the same
    /// name. A name repeated in the URL keeps every value, in URL order.
    pub fn merged_params(&self, url: &Url) -> BTreeMap<String, Vec<String>> {
        let mut from_url: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in url.query_pairs() {
            from_url
                .entry(key.into_owned())
                .or_default()
                .push(value.into_owned());
        }
        let mut params: BTreeMap<String, Vec<String>> = self
            .params
            .iter()
            .map(|(key, value)| (key.clone(), vec![value.clone()]))
            .collect();
        params.extend(from_url);
        params
    }

    /// Builds the final request URL: resolved, with all params in the query.
    pub fn full_url(&self) -> Result<Url, FingerprintError> {
        let mut url = self.resolve_url()?;
        let params = self.merged_params(&url);
        url.set_query(None);
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                params
                    .iter()
                    .flat_map(|(key, values)| values.iter().map(move |value| (key, value))),
            );
        }
        Ok(url)
    }
}

//! Request fingerprints.
//!
//! A [`Fingerprint`] is the identity of a logical request. Two requests with
//! the same fingerprint are interchangeable: one may be answered from the
//! other's cached response, or attached to the other's in-flight dispatch.
//! Collisions are therefore correctness bugs, not just cache pollution.
//!
//! ## Canonical form
//!
//! [`CanonicalFingerprinter`] serializes four components, in this order:
//!
//! 1. **url** - `scheme://host[:port]/path` after resolving against the base
//!    URL; query string and fragment dropped
//! 2. **body** - the canonical body, see [`canonical_body`](crate::canonical::canonical_body)
//! 3. **params** - explicit params merged with URL query params, minus the
//!    excluded keys, in sorted order
//! 4. **method** - upper-case HTTP method
//!
//! ```
//! use inflight_core::{CanonicalFingerprinter, FingerprintConfig, Fingerprinter, RequestConfig};
//!
//! let fingerprinter = CanonicalFingerprinter::new(FingerprintConfig::new().exclude("timestamp"));
//!
//! let by_param = RequestConfig::get("/user")
//!     .base_url("https://api.example.com")
//!     .param("platform", "MTDS")
//!     .param("timestamp", 1);
//! let by_query = RequestConfig::get("https://api.example.com/user?platform=MTDS&timestamp=2");
//!
//! assert_eq!(
//!     fingerprinter.fingerprint(&by_param).unwrap(),
//!     fingerprinter.fingerprint(&by_query).unwrap(),
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::canonical::canonical_body;
use crate::error::FingerprintError;
use crate::request::RequestConfig;

/// Canonical identity of a logical request.
///
/// Wraps an `Arc<str>`, so `clone()` only bumps a reference count.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(Arc<str>);

impl Fingerprint {
    /// Returns the fingerprint as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Fingerprint(Arc::from(value))
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Fingerprint(Arc::from(value))
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.0)
    }
}

/// Fingerprint canonicalization settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FingerprintConfig {
    excluded_params: BTreeSet<String>,
}

impl FingerprintConfig {
    /// Creates a configuration with no excluded params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Excludes a query parameter from fingerprints, e.g. a cache-buster.
    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.excluded_params.insert(key.into());
        self
    }

    /// Returns `true` if `key` is excluded.
    pub fn is_excluded(&self, key: &str) -> bool {
        self.excluded_params.contains(key)
    }

    /// Returns the excluded keys in sorted order.
    pub fn excluded_params(&self) -> impl Iterator<Item = &str> {
        self.excluded_params.iter().map(String::as_str)
    }
}

impl<K: Into<String>> FromIterator<K> for FingerprintConfig {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            excluded_params: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Computes request fingerprints.
///
/// Implemented for closures, so a custom strategy can be plugged in without a
/// new type:
///
/// ```
/// use inflight_core::{Fingerprint, FingerprintError, Fingerprinter, RequestConfig};
///
/// let by_url = |request: &RequestConfig| -> Result<Fingerprint, FingerprintError> {
///     Ok(Fingerprint::from(request.url.as_str()))
/// };
/// assert_eq!(by_url.fingerprint(&RequestConfig::get("/a")).unwrap().as_str(), "/a");
/// ```
pub trait Fingerprinter: Send + Sync {
    /// Returns the fingerprint of `request`.
    fn fingerprint(&self, request: &RequestConfig) -> Result<Fingerprint, FingerprintError>;
}

impl<F> Fingerprinter for F
where
    F: Fn(&RequestConfig) -> Result<Fingerprint, FingerprintError> + Send + Sync,
{
    fn fingerprint(&self, request: &RequestConfig) -> Result<Fingerprint, FingerprintError> {
        self(request)
    }
}

/// The default fingerprint strategy. See the [module docs](self).
#[derive(Debug, Clone, Default)]
pub struct CanonicalFingerprinter {
    config: FingerprintConfig,
}

#[derive(Serialize)]
struct CanonicalRequest<'a> {
    url: String,
    body: Value,
    params: BTreeMap<&'a str, ParamValue<'a>>,
    method: &'a str,
}

/// A param's values: a plain string when there is one, an array otherwise.
#[derive(Serialize)]
#[serde(untagged)]
enum ParamValue<'a> {
    One(&'a str),
    Many(&'a [String]),
}

impl<'a> From<&'a [String]> for ParamValue<'a> {
    fn from(values: &'a [String]) -> Self {
        match values {
            [value] => ParamValue::One(value),
            values => ParamValue::Many(values),
        }
    }
}

impl CanonicalFingerprinter {
    /// Creates a fingerprinter with the given settings.
    pub fn new(config: FingerprintConfig) -> Self {
        Self { config }
    }

    /// Returns the settings.
    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }
}

impl Fingerprinter for CanonicalFingerprinter {
    fn fingerprint(&self, request: &RequestConfig) -> Result<Fingerprint, FingerprintError> {
        let url = request.resolve_url()?;
        let merged = request.merged_params(&url);
        let params = merged
            .iter()
            .filter(|(key, _)| !self.config.is_excluded(key))
            .map(|(key, values)| (key.as_str(), ParamValue::from(values.as_slice())))
            .collect();

        let mut identity = format!("{}://{}", url.scheme(), url.host_str().unwrap_or_default());
        if let Some(port) = url.port() {
            identity.push_str(&format!(":{port}"));
        }
        identity.push_str(url.path());

        let canonical = CanonicalRequest {
            url: identity,
            body: canonical_body(&request.body),
            params,
            method: request.method.as_str(),
        };
        serde_json::to_string(&canonical)
            .map(Fingerprint::from)
            .map_err(|error| FingerprintError::Serialize(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use http::Method;
    use pretty_assertions::{assert_eq, assert_ne};
    use serde_json::json;

    use super::*;
    use crate::request::MultipartField;

    const BASE: &str = "https://apigateway.example.com";

    fn fingerprint(request: &RequestConfig) -> Fingerprint {
        CanonicalFingerprinter::new(FingerprintConfig::new().exclude("timestamp"))
            .fingerprint(request)
            .unwrap()
    }

    #[test]
    fn test_layout_is_stable() {
        let request = RequestConfig::get("/user").base_url(BASE).param("platform", "MTDS");
        assert_eq!(
            fingerprint(&request).as_str(),
            r#"{"url":"https://apigateway.example.com/user","body":null,"params":{"platform":"MTDS"},"method":"GET"}"#
        );
    }

    #[test]
    fn test_equal_across_body_encodings() {
        let post = || RequestConfig::post("/quotation/export").base_url(BASE);
        let json = post().json(json!({"id": 1777184063947182081u64, "other": [1, {"a": 2}]}));
        let form = post().form([
            ("id", "1777184063947182081"),
            ("other[0]", "1"),
            ("other[1][a]", "2"),
        ]);
        let multipart = post().multipart(vec![
            MultipartField::text("other[1][a]", "2"),
            MultipartField::text("id", "1777184063947182081"),
            MultipartField::text("other[0]", "1"),
        ]);

        assert_eq!(fingerprint(&json), fingerprint(&form));
        assert_eq!(fingerprint(&json), fingerprint(&multipart));
    }

    #[test]
    fn test_content_type_header_does_not_matter() {
        let plain = RequestConfig::post("/a").base_url(BASE).json(json!({"x": 1}));
        let labelled = plain.clone().content_type("application/x-www-form-urlencoded");
        assert_eq!(fingerprint(&plain), fingerprint(&labelled));
    }

    #[test]
    fn test_query_in_url_equals_params() {
        let by_params = RequestConfig::get("/user").base_url(BASE).param("b", 2).param("a", 1);
        let by_url = RequestConfig::get(format!("{BASE}/user?a=1&b=2"));
        let mixed = RequestConfig::get("/user?b=2").base_url(BASE).param("a", 1);
        assert_eq!(fingerprint(&by_params), fingerprint(&by_url));
        assert_eq!(fingerprint(&by_params), fingerprint(&mixed));
    }

    #[test]
    fn test_repeated_query_keys_are_distinct() {
        let both = fingerprint(&RequestConfig::get(format!("{BASE}/items?tag=a&tag=b")));
        let last = fingerprint(&RequestConfig::get(format!("{BASE}/items?tag=b")));
        let swapped = fingerprint(&RequestConfig::get(format!("{BASE}/items?tag=b&tag=a")));
        assert_ne!(both, last);
        assert_ne!(both, swapped);
        assert!(both.as_str().contains(r#""params":{"tag":["a","b"]}"#));
    }

    #[test]
    fn test_excluded_params_are_ignored() {
        let first = RequestConfig::get("/user").base_url(BASE).param("timestamp", 1);
        let second = RequestConfig::get("/user?timestamp=99").base_url(BASE);
        let bare = RequestConfig::get("/user").base_url(BASE);
        assert_eq!(fingerprint(&first), fingerprint(&bare));
        assert_eq!(fingerprint(&second), fingerprint(&bare));
    }

    #[test]
    fn test_fragment_dropped_and_host_case_folded() {
        let upper = RequestConfig::get("HTTPS://APIGATEWAY.EXAMPLE.COM/user#top");
        let lower = RequestConfig::get("/user").base_url(BASE);
        assert_eq!(fingerprint(&upper), fingerprint(&lower));
    }

    #[test]
    fn test_distinct_requests_differ() {
        let base = RequestConfig::get("/user").base_url(BASE).param("platform", "MTDS");
        let other_method = RequestConfig { method: Method::DELETE, ..base.clone() };
        let other_path = RequestConfig::get("/users").base_url(BASE).param("platform", "MTDS");
        let other_param = RequestConfig::get("/user").base_url(BASE).param("platform", "WEB");
        let other_port = RequestConfig::get("/user")
            .base_url("https://apigateway.example.com:8443")
            .param("platform", "MTDS");
        let with_body = base.clone().json(json!({"platform": "MTDS"}));

        let all = [&base, &other_method, &other_path, &other_param, &other_port, &with_body];
        for (i, left) in all.iter().enumerate() {
            for right in &all[i + 1..] {
                assert_ne!(fingerprint(left), fingerprint(right));
            }
        }
    }

    #[test]
    fn test_default_port_is_normalized() {
        let explicit = RequestConfig::get("https://apigateway.example.com:443/user");
        let implicit = RequestConfig::get("/user").base_url(BASE);
        assert_eq!(fingerprint(&explicit), fingerprint(&implicit));
    }

    #[test]
    fn test_invalid_url_is_an_error() {
        let error = CanonicalFingerprinter::default()
            .fingerprint(&RequestConfig::get("/no-base"))
            .unwrap_err();
        assert!(matches!(error, FingerprintError::InvalidUrl { .. }));
    }

    #[test]
    fn test_config_from_iterator() {
        let config: FingerprintConfig = ["b", "a"].into_iter().collect();
        assert!(config.is_excluded("a"));
        assert_eq!(config.excluded_params().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}

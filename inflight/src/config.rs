//! Orchestrator configuration.
//!
//! [`Config`] holds the process-wide switches that can be expressed as data.
//! It deserializes with every field optional:
//!
//! ```yaml
//! base_url: https://api.example.com
//! cache: true
//! coalesce: true
//! retry: true
//! timestamp:
//!   param: _t
//! excluded_params: [trace_id]
//! ```
//!
//! Callbacks and predicates are not data and are set on the
//! [`OrchestratorBuilder`](crate::OrchestratorBuilder) instead.

use inflight_core::FingerprintConfig;
use serde::{Deserialize, Serialize};

/// Default name of the cache-busting query parameter.
pub const DEFAULT_TIMESTAMP_PARAM: &str = "timestamp";

/// Process-wide orchestrator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL applied to requests that do not set their own.
    pub base_url: Option<String>,
    /// Allows requests to read and write the response cache.
    ///
    /// Requests still opt in individually with
    /// [`RequestOptions::cache`](crate::RequestOptions::cache); turning this off
    /// disables the cache for everyone.
    pub cache: bool,
    /// Merges concurrent requests with equal fingerprints into one dispatch.
    pub coalesce: bool,
    /// Parks outcomes accepted by the retry predicate in the retry queue.
    pub retry: bool,
    /// Stamps `GET` dispatches with the current time in milliseconds.
    pub timestamp: Option<TimestampConfig>,
    /// Query parameters that never contribute to a fingerprint.
    pub excluded_params: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            cache: true,
            coalesce: true,
            retry: false,
            timestamp: None,
            excluded_params: Vec::new(),
        }
    }
}

impl Config {
    /// Creates a new builder for `Config`.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns the fingerprint settings implied by this config.
    ///
    /// The timestamp parameter, when enabled, is always excluded.
    pub fn fingerprint_config(&self) -> FingerprintConfig {
        self.excluded_params
            .iter()
            .map(String::as_str)
            .chain(self.timestamp.as_ref().map(|stamp| stamp.param.as_str()))
            .collect()
    }
}

/// Cache-busting timestamp settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampConfig {
    /// Query parameter name.
    pub param: String,
}

impl Default for TimestampConfig {
    fn default() -> Self {
        Self {
            param: DEFAULT_TIMESTAMP_PARAM.to_string(),
        }
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = Some(base_url.into());
        self
    }

    /// Enable or disable the response cache.
    pub fn cache(mut self, enabled: bool) -> Self {
        self.config.cache = enabled;
        self
    }

    /// Enable or disable coalescing.
    pub fn coalesce(mut self, enabled: bool) -> Self {
        self.config.coalesce = enabled;
        self
    }

    /// Enable or disable the retry queue.
    pub fn retry(mut self, enabled: bool) -> Self {
        self.config.retry = enabled;
        self
    }

    /// Stamp `GET` dispatches with a timestamp under `param`.
    pub fn timestamp(mut self, param: impl Into<String>) -> Self {
        self.config.timestamp = Some(TimestampConfig {
            param: param.into(),
        });
        self
    }

    /// Exclude a query parameter from fingerprints.
    pub fn exclude_param(mut self, param: impl Into<String>) -> Self {
        self.config.excluded_params.push(param.into());
        self
    }

    /// Build the `Config`.
    pub fn build(self) -> Config {
        self.config
    }
}

#![warn(missing_docs)]
//! # inflight-core
//!
//! Request model, transport contract and fingerprinting for the `inflight`
//! request orchestrator.
//!
//! This crate holds everything a transport implementation needs to know
//! about, without pulling in the orchestrator itself:
//!
//! - **Describe** a request before wire encoding ([`RequestConfig`], [`RequestBody`])
//! - **Identify** equivalent requests ([`Fingerprinter`], [`CanonicalFingerprinter`])
//! - **Send** requests ([`Transport`]) and report outcomes ([`Response`], [`TransportError`])
//! - **Store** successful responses ([`ResponseCache`])
//! - **Classify** outcomes ([`Predicate`])

pub mod cache;
pub mod canonical;
pub mod error;
pub mod fingerprint;
pub mod predicate;
pub mod request;
pub mod response;
pub mod transport;

pub use cache::{CacheHandle, InvalidateFn, ResponseCache};
pub use error::{FingerprintError, TransportError, TransportErrorKind};
pub use fingerprint::{CanonicalFingerprinter, Fingerprint, FingerprintConfig, Fingerprinter};
pub use predicate::{
    And, BoxPredicate, Never, Neutral, Not, Or, Predicate, PredicateExt, ServerError,
    StatusCodes, SuccessStatus,
};
pub use request::{MultipartField, RequestBody, RequestConfig};
pub use response::Response;
pub use transport::Transport;

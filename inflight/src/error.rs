use inflight_core::{FingerprintError, Response, TransportError};
use thiserror::Error;

use crate::pending::DispatchId;

/// Why a request future failed.
///
/// `Clone`: one failed dispatch rejects every caller coalesced onto it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The transport reported a failure that the retry predicate did not accept.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The request could not be fingerprinted, typically an unresolvable URL.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] FingerprintError),
    /// The dispatch was dropped before it settled, e.g. the orchestrator
    /// was dropped while the request sat in the retry queue.
    #[error("dispatch {0} was dropped before it settled")]
    Abandoned(DispatchId),
    /// Every dispatch id has been handed out; ids are never reused.
    #[error("dispatch ids exhausted")]
    DispatchIdsExhausted,
}

impl Error {
    /// Returns the transport error, if this is one.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            Error::Transport(error) => Some(error),
            _ => None,
        }
    }

    /// Returns the response attached to a transport error, e.g. the body of a `404`.
    pub fn response(&self) -> Option<&Response> {
        self.transport().and_then(TransportError::response)
    }
}

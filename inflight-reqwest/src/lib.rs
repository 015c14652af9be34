#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod encode;
mod transport;

pub use transport::ReqwestTransport;

// Re-export reqwest-middleware so callers can build middleware stacks
// against the same version.
pub use reqwest_middleware;

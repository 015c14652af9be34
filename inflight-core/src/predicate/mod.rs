//! Outcome predicates.
//!
//! The orchestrator asks two questions about every completed dispatch:
//!
//! - is this response a *success* worth caching and reporting as `Ok`?
//! - is this failure *retryable*, i.e. should the request be parked in the
//!   retry queue instead of failing?
//!
//! Both questions are answered by a [`Predicate`] over a [`Response`](crate::Response).
//! Predicates compose with the [`PredicateExt`] combinators:
//!
//! ```
//! use http::StatusCode;
//! use inflight_core::predicate::{Predicate, PredicateExt, ServerError, StatusCodes};
//! use inflight_core::{RequestConfig, Response};
//!
//! // Retry 5xx and 429, but never 501.
//! let retryable = ServerError
//!     .or(StatusCodes::new([StatusCode::TOO_MANY_REQUESTS]))
//!     .and(StatusCodes::new([StatusCode::NOT_IMPLEMENTED]).not());
//!
//! let response = |status| Response::new(status, RequestConfig::get("/"));
//! assert!(retryable.check(&response(StatusCode::SERVICE_UNAVAILABLE)));
//! assert!(retryable.check(&response(StatusCode::TOO_MANY_REQUESTS)));
//! assert!(!retryable.check(&response(StatusCode::NOT_IMPLEMENTED)));
//! ```

pub mod combinators;
pub mod neutral;
pub mod status;

use std::sync::Arc;

pub use combinators::{And, FnPredicate, Not, Or, PredicateExt, from_fn};
pub use neutral::{Never, Neutral};
pub use status::{ServerError, StatusCodes, SuccessStatus};

/// A yes/no check over a subject.
///
/// Predicates are evaluated synchronously while the orchestrator settles a
/// dispatch, so they must be cheap and must not block.
pub trait Predicate: Send + Sync {
    /// The type being evaluated.
    type Subject: ?Sized;

    /// Returns `true` if the subject passes.
    fn check(&self, subject: &Self::Subject) -> bool;
}

/// Type-erased predicate.
pub type BoxPredicate<S> = Box<dyn Predicate<Subject = S>>;

impl<T> Predicate for Box<T>
where
    T: Predicate + ?Sized,
{
    type Subject = T::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        self.as_ref().check(subject)
    }
}

impl<T> Predicate for &T
where
    T: Predicate + ?Sized,
{
    type Subject = T::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        (*self).check(subject)
    }
}

impl<T> Predicate for Arc<T>
where
    T: Predicate + ?Sized,
{
    type Subject = T::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        self.as_ref().check(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicate_ext_with_box_dyn() {
        let p1: BoxPredicate<i32> = Box::new(Neutral::<i32>::new());
        let p2: BoxPredicate<i32> = Box::new(Never::<i32>::new());

        assert!(p1.or(p2).check(&42));
    }

    #[test]
    fn test_predicate_ext_chaining_with_box_dyn() {
        let p1: BoxPredicate<i32> = Box::new(Neutral::<i32>::new());
        let p2: BoxPredicate<i32> = Box::new(Neutral::<i32>::new());
        let p3: BoxPredicate<i32> = Box::new(Neutral::<i32>::new());

        // true AND true OR true, inverted
        assert!(!p1.and(p2).or(p3).not().check(&42));
    }

    #[test]
    fn test_boxed_in_vec() {
        let predicates: Vec<BoxPredicate<i32>> = vec![
            Neutral::<i32>::new().boxed(),
            Neutral::<i32>::new().not().boxed(),
            from_fn(|value: &i32| *value > 1).boxed(),
        ];

        let results: Vec<bool> = predicates.iter().map(|p| p.check(&2)).collect();
        assert_eq!(results, vec![true, false, true]);
    }

    #[test]
    fn test_shared_predicate() {
        let shared = Arc::new(from_fn(|value: &i32| *value % 2 == 0));
        let clone = Arc::clone(&shared);
        assert!(shared.check(&4));
        assert!(!clone.check(&3));
    }
}

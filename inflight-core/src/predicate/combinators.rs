//! Logical combinators for composing predicates.
//!
//! ```
//! use inflight_core::predicate::{Neutral, PredicateExt, from_fn};
//!
//! let positive_even = from_fn(|n: &i32| *n > 0).and(from_fn(|n: &i32| n % 2 == 0));
//! let anything = Neutral::<i32>::new().or(positive_even);
//! ```

use std::fmt;
use std::marker::PhantomData;

use super::Predicate;

/// Inverts a predicate.
#[derive(Debug, Clone)]
pub struct Not<P> {
    predicate: P,
}

impl<P> Not<P> {
    /// Creates a new `Not` combinator wrapping the given predicate.
    pub fn new(predicate: P) -> Self {
        Self { predicate }
    }
}

impl<P> Predicate for Not<P>
where
    P: Predicate,
{
    type Subject = P::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        !self.predicate.check(subject)
    }
}

/// Requires both predicates to pass.
///
/// Short-circuits: if the left predicate fails, the right predicate is not
/// evaluated.
#[derive(Debug, Clone)]
pub struct And<L, R> {
    left: L,
    right: R,
}

impl<L, R> And<L, R> {
    /// Creates a new `And` combinator from two predicates.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L, R> Predicate for And<L, R>
where
    L: Predicate,
    R: Predicate<Subject = L::Subject>,
{
    type Subject = L::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        self.left.check(subject) && self.right.check(subject)
    }
}

/// Requires either predicate to pass.
///
/// Short-circuits: if the left predicate passes, the right predicate is not
/// evaluated.
#[derive(Debug, Clone)]
pub struct Or<L, R> {
    left: L,
    right: R,
}

impl<L, R> Or<L, R> {
    /// Creates a new `Or` combinator from two predicates.
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }
}

impl<L, R> Predicate for Or<L, R>
where
    L: Predicate,
    R: Predicate<Subject = L::Subject>,
{
    type Subject = L::Subject;

    fn check(&self, subject: &Self::Subject) -> bool {
        self.left.check(subject) || self.right.check(subject)
    }
}

/// A predicate backed by a closure. Created by [`from_fn`].
pub struct FnPredicate<S: ?Sized, F> {
    f: F,
    _subject: PhantomData<fn(&S) -> bool>,
}

/// Wraps a closure as a predicate.
pub fn from_fn<S, F>(f: F) -> FnPredicate<S, F>
where
    S: ?Sized,
    F: Fn(&S) -> bool + Send + Sync,
{
    FnPredicate {
        f,
        _subject: PhantomData,
    }
}

impl<S: ?Sized, F: Clone> Clone for FnPredicate<S, F> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _subject: PhantomData,
        }
    }
}

impl<S: ?Sized, F> fmt::Debug for FnPredicate<S, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnPredicate").finish_non_exhaustive()
    }
}

impl<S, F> Predicate for FnPredicate<S, F>
where
    S: ?Sized,
    F: Fn(&S) -> bool + Send + Sync,
{
    type Subject = S;

    fn check(&self, subject: &S) -> bool {
        (self.f)(subject)
    }
}

/// Extension trait for fluent predicate composition.
pub trait PredicateExt: Predicate + Sized {
    /// Combines this predicate with another using AND logic.
    fn and<R>(self, right: R) -> And<Self, R>
    where
        R: Predicate<Subject = Self::Subject>,
    {
        And::new(self, right)
    }

    /// Combines this predicate with another using OR logic.
    fn or<R>(self, right: R) -> Or<Self, R>
    where
        R: Predicate<Subject = Self::Subject>,
    {
        Or::new(self, right)
    }

    /// Inverts this predicate.
    fn not(self) -> Not<Self> {
        Not::new(self)
    }

    /// Boxes this predicate into a trait object.
    fn boxed(self) -> Box<dyn Predicate<Subject = Self::Subject>>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T: Predicate + Sized> PredicateExt for T {}

//! Constant predicates.

use std::fmt;
use std::marker::PhantomData;

use super::Predicate;

/// A predicate that always passes.
///
/// Used as the retry predicate when every failure with a response should be
/// queued, or as a starting point for predicate chains.
#[derive(Clone, Copy)]
pub struct Neutral<S: ?Sized> {
    _phantom: PhantomData<fn(&S) -> bool>,
}

impl<S: ?Sized> fmt::Debug for Neutral<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Neutral").finish()
    }
}

impl<S: ?Sized> Default for Neutral<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Neutral<S> {
    /// Creates a new neutral predicate.
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S: ?Sized> Predicate for Neutral<S> {
    type Subject = S;

    fn check(&self, _subject: &S) -> bool {
        true
    }
}

/// A predicate that never passes.
#[derive(Clone, Copy)]
pub struct Never<S: ?Sized> {
    _phantom: PhantomData<fn(&S) -> bool>,
}

impl<S: ?Sized> fmt::Debug for Never<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Never").finish()
    }
}

impl<S: ?Sized> Default for Never<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ?Sized> Never<S> {
    /// Creates a predicate that rejects every subject.
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S: ?Sized> Predicate for Never<S> {
    type Subject = S;

    fn check(&self, _subject: &S) -> bool {
        false
    }
}

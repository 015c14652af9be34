//! In-memory response cache.
//!
//! Maps a [`Fingerprint`] to the first successful [`Response`] seen for it.
//! There is no expiry and no size bound: entries live until something
//! invalidates them, usually an [`InvalidateFn`] attached to a request whose
//! success makes other entries stale (e.g. a profile update evicting the
//! "current user" entry).
//!
//! ```
//! use http::StatusCode;
//! use inflight_core::{Fingerprint, RequestConfig, Response, ResponseCache};
//!
//! let cache = ResponseCache::new();
//! let key = Fingerprint::from("user");
//! let first = Response::new(StatusCode::OK, RequestConfig::get("/user")).with_data("first");
//! let second = Response::new(StatusCode::OK, RequestConfig::get("/user")).with_data("second");
//!
//! assert!(cache.put(key.clone(), first));
//! assert!(!cache.put(key.clone(), second));
//! assert_eq!(cache.get(&key).unwrap().data, "first");
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::fingerprint::Fingerprint;
use crate::response::Response;

/// Per-request cache invalidation callback.
///
/// Receives the whole cache so it can evict entries unrelated to the request
/// that triggered it. Runs synchronously; it must not issue requests through
/// the orchestrator.
pub type InvalidateFn = Arc<dyn Fn(&ResponseCache) + Send + Sync>;

/// Unbounded fingerprint → response map with first-writer-wins writes.
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<DashMap<Fingerprint, Response>>,
}

impl ResponseCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the cached response for `fingerprint`.
    pub fn get(&self, fingerprint: &Fingerprint) -> Option<Response> {
        self.entries
            .get(fingerprint)
            .map(|entry| entry.value().clone())
    }

    /// Stores `response` unless an entry already exists.
    ///
    /// Returns `true` if the response was stored. An existing entry is never
    /// overwritten; it has to be invalidated first.
    pub fn put(&self, fingerprint: Fingerprint, response: Response) -> bool {
        match self.entries.entry(fingerprint) {
            Entry::Occupied(entry) => {
                tracing::trace!(fingerprint = %entry.key(), "cache entry already present");
                false
            }
            Entry::Vacant(entry) => {
                tracing::trace!(fingerprint = %entry.key(), "cache entry stored");
                entry.insert(response);
                true
            }
        }
    }

    /// Removes the entry for `fingerprint`. Returns `true` if one existed.
    pub fn invalidate(&self, fingerprint: &Fingerprint) -> bool {
        let removed = self.entries.remove(fingerprint).is_some();
        if removed {
            tracing::debug!(%fingerprint, "cache entry invalidated");
        }
        removed
    }

    /// Keeps only the entries for which `keep` returns `true`.
    ///
    /// `keep` must not call back into this cache.
    pub fn retain(&self, mut keep: impl FnMut(&Fingerprint, &Response) -> bool) {
        self.entries
            .retain(|fingerprint, response| keep(fingerprint, &*response));
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns `true` if `fingerprint` has an entry.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Returns the fingerprints currently cached, in no particular order.
    pub fn keys(&self) -> Vec<Fingerprint> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Creates a handle that can later remove the entry for `fingerprint`.
    pub fn handle(&self, fingerprint: Fingerprint) -> CacheHandle {
        CacheHandle {
            fingerprint,
            entries: Arc::downgrade(&self.entries),
        }
    }
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("len", &self.entries.len())
            .finish()
    }
}

/// Handle to a single cache entry.
///
/// Holds the cache weakly: a handle never keeps a dropped cache alive.
#[derive(Clone)]
pub struct CacheHandle {
    fingerprint: Fingerprint,
    entries: Weak<DashMap<Fingerprint, Response>>,
}

impl CacheHandle {
    /// Returns the fingerprint of the entry.
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Removes the entry. Returns `true` if it was still cached.
    pub fn invalidate(&self) -> bool {
        self.entries
            .upgrade()
            .is_some_and(|entries| entries.remove(&self.fingerprint).is_some())
    }
}

impl fmt::Debug for CacheHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheHandle")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::request::RequestConfig;

    fn response(body: &'static str) -> Response {
        Response::new(StatusCode::OK, RequestConfig::get("/user")).with_data(body)
    }

    #[test]
    fn test_first_writer_wins() {
        let cache = ResponseCache::new();
        let key = Fingerprint::from("a");
        assert!(cache.put(key.clone(), response("first")));
        assert!(!cache.put(key.clone(), response("second")));
        assert_eq!(cache.get(&key).unwrap().data, "first");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_put_after_invalidate_stores_again() {
        let cache = ResponseCache::new();
        let key = Fingerprint::from("a");
        cache.put(key.clone(), response("first"));
        assert!(cache.invalidate(&key));
        assert!(!cache.invalidate(&key));
        assert!(cache.put(key.clone(), response("second")));
        assert_eq!(cache.get(&key).unwrap().data, "second");
    }

    #[test]
    fn test_retain_evicts_by_relationship() {
        let cache = ResponseCache::new();
        cache.put(Fingerprint::from("user"), response("me"));
        cache.put(Fingerprint::from("orders"), response("list"));
        cache.retain(|fingerprint, _| fingerprint.as_str() != "user");
        assert!(!cache.contains(&Fingerprint::from("user")));
        assert!(cache.contains(&Fingerprint::from("orders")));
    }

    #[test]
    fn test_clones_share_entries() {
        let cache = ResponseCache::new();
        let other = cache.clone();
        other.put(Fingerprint::from("a"), response("x"));
        assert!(cache.contains(&Fingerprint::from("a")));
        cache.clear();
        assert!(other.is_empty());
    }

    #[test]
    fn test_handle_invalidates_its_entry() {
        let cache = ResponseCache::new();
        let key = Fingerprint::from("a");
        cache.put(key.clone(), response("x"));
        let stored = response("x").with_cache_handle(cache.handle(key.clone()));
        assert!(stored.invalidate_cache());
        assert!(!cache.contains(&key));
        assert!(!stored.invalidate_cache());
    }

    #[test]
    fn test_handle_outliving_cache_is_inert() {
        let cache = ResponseCache::new();
        let handle = cache.handle(Fingerprint::from("a"));
        drop(cache);
        assert!(!handle.invalidate());
    }
}

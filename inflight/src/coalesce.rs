//! Coalescing registry.
//!
//! Maps a fingerprint to the shared outcome of the one dispatch currently
//! serving it. Entries are created when a fresh dispatch starts and removed
//! when that dispatch settles for good; a dispatch parked in the retry queue
//! keeps its entry so later equivalent requests keep attaching to it.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use inflight_core::Fingerprint;
use tracing::{trace, warn};

use crate::pending::{DispatchId, SharedOutcome};

/// Fingerprint → in-flight dispatch.
#[derive(Default)]
pub struct CoalescingRegistry {
    entries: HashMap<Fingerprint, (DispatchId, SharedOutcome)>,
}

impl fmt::Debug for CoalescingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(fingerprint, (id, _))| (fingerprint, id)))
            .finish()
    }
}

impl CoalescingRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dispatch serving `fingerprint`, if any.
    pub fn attach(&self, fingerprint: &Fingerprint) -> Option<(DispatchId, SharedOutcome)> {
        self.entries
            .get(fingerprint)
            .map(|(id, outcome)| (*id, outcome.clone()))
    }

    /// Makes dispatch `id` the one serving `fingerprint`.
    ///
    /// An existing entry is kept; callers check [`attach`](Self::attach) first.
    pub fn register(&mut self, fingerprint: Fingerprint, id: DispatchId, outcome: SharedOutcome) {
        match self.entries.entry(fingerprint) {
            Entry::Occupied(entry) => {
                warn!(
                    fingerprint = %entry.key(),
                    existing = %entry.get().0,
                    dispatch_id = %id,
                    "coalescing entry already registered"
                );
            }
            Entry::Vacant(entry) => {
                entry.insert((id, outcome));
            }
        }
    }

    /// Removes the entry for `fingerprint` if dispatch `id` backs it.
    ///
    /// Returns `true` if an entry was removed.
    pub fn release(&mut self, fingerprint: &Fingerprint, id: DispatchId) -> bool {
        match self.entries.get(fingerprint) {
            Some((owner, _)) if *owner == id => {
                self.entries.remove(fingerprint);
                trace!(%fingerprint, dispatch_id = %id, "coalescing entry released");
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if `fingerprint` has a live entry.
    pub fn contains(&self, fingerprint: &Fingerprint) -> bool {
        self.entries.contains_key(fingerprint)
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no live entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Pending request table.
//!
//! Every request that actually reaches the transport gets a [`DispatchId`]
//! and a record here. The record owns the resolver for the caller-facing
//! future and the immutable snapshot of the outbound config; it is removed
//! exactly once, when the dispatch settles.

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use inflight_core::{Fingerprint, RequestConfig, Response};
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::Error;
use crate::options::RequestOptions;

/// The outcome every party waiting on one dispatch observes.
pub type Outcome = Result<Response, Error>;

/// A clonable future resolving to a dispatch's outcome.
pub type SharedOutcome = Shared<BoxFuture<'static, Outcome>>;

/// Identifier of one dispatch, unique for the lifetime of an orchestrator.
///
/// Ids start at 1 and increase in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DispatchId(NonZeroU64);

impl DispatchId {
    /// The first id handed out.
    pub const FIRST: DispatchId = DispatchId(NonZeroU64::MIN);

    /// Returns the id as a plain integer.
    pub fn get(self) -> u64 {
        self.0.get()
    }

    /// The last id that can be handed out.
    pub const LAST: DispatchId = DispatchId(NonZeroU64::MAX);

    /// Returns the following id, or `None` once [`LAST`](Self::LAST) is reached.
    fn next(self) -> Option<DispatchId> {
        self.0.checked_add(1).map(DispatchId)
    }
}

impl fmt::Display for DispatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Side-channel data kept beside a dispatch, never inside its config.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// Fingerprint of the caller's request.
    pub fingerprint: Fingerprint,
    /// Options the caller passed.
    pub options: RequestOptions,
    /// Whether this dispatch backs a coalescing entry.
    pub coalesced: bool,
    /// Number of transport calls made for this dispatch so far.
    pub attempt: u32,
}

/// A live dispatch.
pub struct DispatchRecord {
    /// Outbound config as sent to the transport.
    pub config: Arc<RequestConfig>,
    /// Side-channel data.
    pub context: DispatchContext,
    resolver: oneshot::Sender<Outcome>,
}

impl fmt::Debug for DispatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchRecord")
            .field("config", &self.config)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// The pending list at one point in time.
///
/// `revision` grows with every registration and settlement, so observers
/// receiving changes out of order can drop stale ones.
#[derive(Debug, Clone)]
pub struct PendingChange {
    /// Number of changes made to the table so far.
    pub revision: u64,
    /// Outbound configs of every pending dispatch, in dispatch order.
    pub snapshot: Vec<Arc<RequestConfig>>,
}

/// Dispatch id → record, ordered by dispatch order.
#[derive(Debug)]
pub struct PendingTable {
    next_id: Option<DispatchId>,
    revision: u64,
    records: BTreeMap<DispatchId, DispatchRecord>,
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::starting_at(DispatchId::FIRST)
    }
}

impl PendingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn starting_at(first: DispatchId) -> Self {
        Self {
            next_id: Some(first),
            revision: 0,
            records: BTreeMap::new(),
        }
    }

    /// Registers a new dispatch.
    ///
    /// Returns its id and the future every waiter should await. If the record
    /// is dropped without being settled, the future yields
    /// [`Error::Abandoned`].
    ///
    /// Fails with [`Error::DispatchIdsExhausted`] once every id has been
    /// handed out; ids are never reused.
    pub fn register(
        &mut self,
        config: Arc<RequestConfig>,
        context: DispatchContext,
    ) -> Result<(DispatchId, SharedOutcome), Error> {
        let id = self.next_id.ok_or(Error::DispatchIdsExhausted)?;
        self.next_id = id.next();
        self.revision += 1;

        let (resolver, receiver) = oneshot::channel();
        let outcome = receiver
            .map(move |received| received.unwrap_or(Err(Error::Abandoned(id))))
            .boxed()
            .shared();

        trace!(dispatch_id = %id, fingerprint = %context.fingerprint, "dispatch registered");
        self.records.insert(
            id,
            DispatchRecord {
                config,
                context,
                resolver,
            },
        );
        Ok((id, outcome))
    }

    /// Returns the record for `id`.
    pub fn get(&self, id: DispatchId) -> Option<&DispatchRecord> {
        self.records.get(&id)
    }

    /// Returns the record for `id` mutably.
    pub fn get_mut(&mut self, id: DispatchId) -> Option<&mut DispatchRecord> {
        self.records.get_mut(&id)
    }

    /// Settles `id` successfully. See [`settle`](Self::settle).
    pub fn resolve(&mut self, id: DispatchId, response: Response) -> bool {
        self.settle(id, Ok(response))
    }

    /// Settles `id` with an error. See [`settle`](Self::settle).
    pub fn reject(&mut self, id: DispatchId, error: Error) -> bool {
        self.settle(id, Err(error))
    }

    /// Removes `id` and hands `outcome` to its waiters.
    ///
    /// Returns `false` if `id` is not pending, in which case nothing happens.
    pub fn settle(&mut self, id: DispatchId, outcome: Outcome) -> bool {
        let Some(record) = self.records.remove(&id) else {
            debug!(dispatch_id = %id, "settle for unknown dispatch ignored");
            return false;
        };
        self.revision += 1;
        if record.resolver.send(outcome).is_err() {
            trace!(dispatch_id = %id, "dispatch settled with no waiters left");
        }
        true
    }

    /// Returns the outbound configs of every pending dispatch, in dispatch order.
    pub fn snapshot(&self) -> Vec<Arc<RequestConfig>> {
        self.records
            .values()
            .map(|record| Arc::clone(&record.config))
            .collect()
    }

    /// Returns the current snapshot tagged with the table's revision.
    pub fn change(&self) -> PendingChange {
        PendingChange {
            revision: self.revision,
            snapshot: self.snapshot(),
        }
    }

    /// Returns `true` if `id` is pending.
    pub fn contains(&self, id: DispatchId) -> bool {
        self.records.contains_key(&id)
    }

    /// Returns the number of pending dispatches.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

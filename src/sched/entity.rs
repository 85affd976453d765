//! Per-entity scheduling state.
//!
//! One record per schedulable unit: its base priority, the cached effective
//! priority (base plus donated ticket sums), the queues it currently owns,
//! and the single queue it waits in, if any. The cache carries a stale flag;
//! the registry recomputes on read and during donation propagation.

use crate::types::{QueueId, Tickets, DEFAULT_PRIORITY};
use smallvec::SmallVec;

/// Scheduling record for a single entity.
///
/// Invariant: when the cache is not stale, `effective >= base` (donation
/// only ever adds tickets, saturating at the ceiling).
#[derive(Debug, Clone)]
pub(crate) struct EntityState {
    base: Tickets,
    effective: Tickets,
    stale: bool,
    owned: SmallVec<[QueueId; 4]>,
    waiting_on: Option<QueueId>,
}

impl EntityState {
    pub(crate) fn new() -> Self {
        Self {
            base: DEFAULT_PRIORITY,
            effective: DEFAULT_PRIORITY,
            stale: false,
            owned: SmallVec::new(),
            waiting_on: None,
        }
    }

    pub(crate) const fn base(&self) -> Tickets {
        self.base
    }

    /// Updates the base priority and invalidates the effective cache.
    pub(crate) fn set_base(&mut self, value: Tickets) {
        self.base = value;
        self.stale = true;
    }

    /// Returns the cached effective priority without freshness checks.
    pub(crate) const fn effective(&self) -> Tickets {
        self.effective
    }

    pub(crate) const fn is_stale(&self) -> bool {
        self.stale
    }

    /// Stores a freshly computed effective priority and clears staleness.
    pub(crate) fn set_effective(&mut self, value: Tickets) {
        debug_assert!(value >= self.base, "effective priority below base");
        self.effective = value;
        self.stale = false;
    }

    pub(crate) fn owned(&self) -> &[QueueId] {
        &self.owned
    }

    /// Records ownership of a queue. Idempotent.
    pub(crate) fn add_owned(&mut self, queue: QueueId) {
        if !self.owned.contains(&queue) {
            self.owned.push(queue);
        }
    }

    /// Drops ownership of a queue; returns whether it was held.
    pub(crate) fn remove_owned(&mut self, queue: QueueId) -> bool {
        if let Some(pos) = self.owned.iter().position(|q| *q == queue) {
            self.owned.swap_remove(pos);
            true
        } else {
            false
        }
    }

    pub(crate) const fn waiting_on(&self) -> Option<QueueId> {
        self.waiting_on
    }

    pub(crate) fn set_waiting(&mut self, queue: Option<QueueId>) {
        self.waiting_on = queue;
    }
}

impl Default for EntityState {
    fn default() -> Self {
        Self::new()
    }
}

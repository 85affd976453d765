//! Resource queues: waiter bookkeeping, the lazy ticket-sum cache, and the
//! cumulative-scan lottery pick.
//!
//! A queue stores each waiter's ticket contribution next to the waiter in
//! insertion order. The lottery scan and test tie-breaking follow that
//! order, and it is the only iteration order this module exposes.
//!
//! The ticket sum is cached with a dirty flag and recomputed on read. Every
//! mutation of the waiter set or of a stored contribution passes through a
//! method on this type that sets the flag; there is no other mutation path.

use crate::types::{EntityId, Tickets};
use core::fmt;

/// Per-resource wait queue with an optional donation policy.
pub(crate) struct QueueRecord {
    donation: bool,
    waiters: Vec<(EntityId, Tickets)>,
    owner: Option<EntityId>,
    sum: Tickets,
    dirty: bool,
}

impl QueueRecord {
    pub(crate) const fn new(donation: bool) -> Self {
        Self {
            donation,
            waiters: Vec::new(),
            owner: None,
            sum: 0,
            dirty: false,
        }
    }

    /// Whether waiters donate their tickets to the owner.
    pub(crate) const fn donation(&self) -> bool {
        self.donation
    }

    pub(crate) const fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    pub(crate) fn set_owner(&mut self, owner: Option<EntityId>) {
        self.owner = owner;
    }

    pub(crate) fn take_owner(&mut self) -> Option<EntityId> {
        self.owner.take()
    }

    pub(crate) fn contains(&self, entity: EntityId) -> bool {
        self.waiters.iter().any(|(e, _)| *e == entity)
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Appends a waiter with its ticket contribution.
    ///
    /// The caller checks membership first; a duplicate insert would count
    /// the entity's tickets twice.
    pub(crate) fn enqueue(&mut self, entity: EntityId, tickets: Tickets) {
        debug_assert!(!self.contains(entity), "duplicate waiter {entity}");
        self.waiters.push((entity, tickets));
        self.dirty = true;
    }

    /// Removes a waiter, returning its stored contribution.
    pub(crate) fn dequeue(&mut self, entity: EntityId) -> Option<Tickets> {
        let pos = self.waiters.iter().position(|(e, _)| *e == entity)?;
        let (_, tickets) = self.waiters.remove(pos);
        self.dirty = true;
        Some(tickets)
    }

    /// Replaces a waiter's stored contribution.
    ///
    /// No-op when the entity is not a waiter or the value is unchanged
    /// (an unchanged value cannot move the sum, so the cache stays valid).
    pub(crate) fn update_contribution(&mut self, entity: EntityId, tickets: Tickets) {
        if let Some((_, stored)) = self.waiters.iter_mut().find(|(e, _)| *e == entity) {
            if *stored != tickets {
                *stored = tickets;
                self.dirty = true;
            }
        }
    }

    /// Returns the ticket sum, recomputing the cache if dirty.
    pub(crate) fn ticket_sum(&mut self) -> Tickets {
        if self.dirty {
            self.sum = self.true_sum();
            self.dirty = false;
        }
        self.sum
    }

    /// Sums the stored contributions directly, bypassing the cache.
    pub(crate) fn true_sum(&self) -> Tickets {
        self.waiters
            .iter()
            .fold(0, |acc: Tickets, (_, t)| acc.saturating_add(*t))
    }

    /// Returns the cached sum, or `None` while the cache is dirty.
    pub(crate) const fn cached_sum(&self) -> Option<Tickets> {
        if self.dirty {
            None
        } else {
            Some(self.sum)
        }
    }

    /// Resolves a draw `r` in `[1, sum]` to a winner.
    ///
    /// Scans waiters in insertion order accumulating contributions; the
    /// first waiter whose cumulative total reaches `r` wins, so each
    /// waiter's chance is proportional to its contribution. Returns `None`
    /// when `r` exceeds the total (including the empty-queue case).
    pub(crate) fn pick(&self, r: Tickets) -> Option<EntityId> {
        debug_assert!(r >= 1, "draws start at ticket 1");
        let mut cumulative: Tickets = 0;
        for (entity, tickets) in &self.waiters {
            cumulative = cumulative.saturating_add(*tickets);
            if cumulative >= r {
                return Some(*entity);
            }
        }
        None
    }

    /// Insertion-ordered view of the waiter set.
    pub(crate) fn waiters(&self) -> &[(EntityId, Tickets)] {
        &self.waiters
    }
}

impl fmt::Debug for QueueRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueRecord")
            .field("donation", &self.donation)
            .field("owner", &self.owner)
            .field("waiters", &self.waiters)
            .field("sum", &self.sum)
            .field("dirty", &self.dirty)
            .finish()
    }
}

//! Identifier types for scheduler entities and resource queues.
//!
//! `EntityId` is minted by the caller (the cooperative thread manager owns
//! the mapping from its threads to entity ids); the registry creates
//! per-entity state lazily on first reference. `QueueId` is minted by the
//! scheduler itself and wraps a generation-checked arena index so a stale
//! handle can never alias a recycled slot.

use crate::util::ArenaIndex;
use core::fmt;

/// Identity of a schedulable unit.
///
/// Opaque and unique per unit; the scheduler never interprets the raw value.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates an entity id from a caller-chosen raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw value this id was created with.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Handle for a resource queue.
///
/// Queues live in the scheduler's arena; the handle carries the slot's
/// generation so lookups through a stale handle fail instead of reading a
/// reused slot.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueueId(pub(crate) ArenaIndex);

impl QueueId {
    /// Creates a queue id from an arena index (internal use).
    #[must_use]
    pub(crate) const fn from_arena(index: ArenaIndex) -> Self {
        Self(index)
    }

    /// Returns the underlying arena index (internal use).
    #[must_use]
    pub(crate) const fn arena_index(self) -> ArenaIndex {
        self.0
    }
}

impl fmt::Debug for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueueId({}:{})", self.0.index(), self.0.generation())
    }
}

impl fmt::Display for QueueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0.index())
    }
}

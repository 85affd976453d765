//! Error types for the lottery scheduler.
//!
//! Two classes of failure come out of this crate:
//!
//! - [`SchedError::OutOfRange`] is a recoverable caller error: the request
//!   is rejected and state is unchanged.
//! - The wait/acquire protocol violations (`AlreadyWaiting`, `AlreadyQueued`,
//!   `OwnershipCycle`) indicate caller misuse. They are reported as typed
//!   errors so the embedding thread manager can decide how loudly to die,
//!   but recovering and retrying them is not meaningful.

use crate::types::{EntityId, QueueId, Tickets};
use thiserror::Error;

/// Errors surfaced by scheduler operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SchedError {
    /// Requested base priority lies outside the permitted range.
    #[error("priority {value} below minimum {min}")]
    OutOfRange {
        /// The rejected priority value.
        value: Tickets,
        /// The minimum permitted base priority.
        min: Tickets,
    },

    /// The entity is already waiting in a queue; an entity waits in at most
    /// one queue at a time.
    #[error("{entity} is already waiting in {queue}")]
    AlreadyWaiting {
        /// The entity that attempted to wait.
        entity: EntityId,
        /// The queue it is already waiting in.
        queue: QueueId,
    },

    /// The entity is already a member of this queue's waiter set.
    #[error("{entity} is already enqueued in {queue}")]
    AlreadyQueued {
        /// The entity that attempted to wait.
        entity: EntityId,
        /// The queue it is already enqueued in.
        queue: QueueId,
    },

    /// The operation would make the wait/own graph cyclic.
    #[error("{entity} on {queue} would create an ownership cycle")]
    OwnershipCycle {
        /// The entity whose wait or acquisition was rejected.
        entity: EntityId,
        /// The queue the cycle would close through.
        queue: QueueId,
    },

    /// The queue handle does not resolve to a live queue.
    #[error("unknown queue {queue}")]
    UnknownQueue {
        /// The stale or foreign handle.
        queue: QueueId,
    },
}

/// Result alias for scheduler operations.
pub type Result<T> = core::result::Result<T, SchedError>;

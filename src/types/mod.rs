//! Core types: identifiers and ticket arithmetic.
//!
//! Priorities and ticket counts share one domain: a base priority of `n` is
//! worth `n` lottery tickets, and donated tickets add on top. All arithmetic
//! on tickets saturates at [`MAX_PRIORITY`]; a ticket count never wraps.

pub mod id;

pub use id::{EntityId, QueueId};

/// A ticket count, also used for base and effective priorities.
pub type Tickets = u64;

/// The minimum base priority an entity can hold.
pub const MIN_PRIORITY: Tickets = 1;

/// The maximum base priority, and the saturation point for all ticket sums.
pub const MAX_PRIORITY: Tickets = Tickets::MAX;

/// The base priority assigned to an entity on first reference.
pub const DEFAULT_PRIORITY: Tickets = 1;

//! The lottery scheduler: registry, queues, and the exclusion boundary.
//!
//! [`SchedulerState`] holds all semantics as plain `&mut self` operations.
//! [`LotteryScheduler`] is the handle a cooperative thread manager embeds:
//! it wraps the state in a single mutex so that every public operation —
//! waiting, acquiring, running the lottery, changing priorities — is atomic
//! with respect to every other. Nothing here blocks the caller; suspending
//! a waiting entity is the thread manager's job.

mod entity;
mod queue;
mod state;

pub use state::SchedulerState;

use crate::error::Result;
use crate::types::{EntityId, QueueId, Tickets};
use parking_lot::Mutex;

/// Seed used by [`LotteryScheduler::new`]. Fixed so that a default-built
/// scheduler is still reproducible; callers wanting varied runs pass their
/// own seed to [`LotteryScheduler::with_seed`].
pub const DEFAULT_SEED: u64 = 0x5eed_1077_e12a_ff1e;

/// Ticket-based lottery scheduler with transitive priority donation.
///
/// Cheap to construct, one instance per scheduling domain; independent
/// instances share nothing. All methods take `&self` and serialize through
/// an internal lock, which is the "single global exclusion" discipline the
/// semantics require: no operation interleaves partially with another.
#[derive(Debug)]
pub struct LotteryScheduler {
    state: Mutex<SchedulerState>,
}

impl LotteryScheduler {
    /// Creates a scheduler with the default seed.
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Creates a scheduler whose lottery draws come from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            state: Mutex::new(SchedulerState::new(seed)),
        }
    }

    /// Creates a resource queue; `donation` fixes whether waiters donate
    /// their tickets to the queue's owner.
    pub fn create_queue(&self, donation: bool) -> QueueId {
        self.state.lock().create_queue(donation)
    }

    /// Enqueues `entity` as a waiter on `queue`.
    pub fn wait_for_access(&self, queue: QueueId, entity: EntityId) -> Result<()> {
        self.state.lock().wait_for_access(queue, entity)
    }

    /// Makes `entity` the owner of `queue`, releasing any previous owner.
    pub fn acquire(&self, queue: QueueId, entity: EntityId) -> Result<()> {
        self.state.lock().acquire(queue, entity)
    }

    /// Releases `queue`'s ownership without selecting a successor.
    pub fn release(&self, queue: QueueId) -> Result<()> {
        self.state.lock().release(queue)
    }

    /// Runs the lottery and hands ownership to the winner, if any.
    pub fn next_thread(&self, queue: QueueId) -> Result<Option<EntityId>> {
        self.state.lock().next_thread(queue)
    }

    /// Resolves an explicit draw value without transferring ownership.
    pub fn winner_for_draw(&self, queue: QueueId, draw: Tickets) -> Result<Option<EntityId>> {
        self.state.lock().winner_for_draw(queue, draw)
    }

    /// Returns `queue`'s current ticket sum.
    pub fn ticket_sum(&self, queue: QueueId) -> Result<Tickets> {
        self.state.lock().ticket_sum(queue)
    }

    /// Whether `entity` currently waits on `queue`.
    pub fn contains(&self, queue: QueueId, entity: EntityId) -> Result<bool> {
        self.state.lock().contains(queue, entity)
    }

    /// Whether `queue` has no waiters.
    pub fn is_empty(&self, queue: QueueId) -> Result<bool> {
        self.state.lock().is_empty(queue)
    }

    /// The number of waiters on `queue`.
    pub fn queue_len(&self, queue: QueueId) -> Result<usize> {
        self.state.lock().queue_len(queue)
    }

    /// The current owner of `queue`, if any.
    pub fn owner(&self, queue: QueueId) -> Result<Option<EntityId>> {
        self.state.lock().owner(queue)
    }

    /// Returns `entity`'s raw base priority.
    pub fn priority(&self, entity: EntityId) -> Tickets {
        self.state.lock().priority(entity)
    }

    /// Returns `entity`'s effective priority (base plus donations).
    pub fn effective_priority(&self, entity: EntityId) -> Tickets {
        self.state.lock().effective_priority(entity)
    }

    /// Sets `entity`'s base priority; fails with `OutOfRange` below the
    /// minimum, leaving state untouched.
    pub fn set_base_priority(&self, entity: EntityId, value: Tickets) -> Result<()> {
        self.state.lock().set_base_priority(entity, value)
    }

    /// Raises `entity`'s base priority by one; `false` at the ceiling.
    pub fn increase_priority(&self, entity: EntityId) -> bool {
        self.state.lock().increase_priority(entity)
    }

    /// Lowers `entity`'s base priority by one; `false` at the floor.
    pub fn decrease_priority(&self, entity: EntityId) -> bool {
        self.state.lock().decrease_priority(entity)
    }

    /// Runs `f` under the scheduler lock.
    ///
    /// For call sequences that must be observed atomically as a group
    /// (e.g. enqueue several entities and hold one lottery with no
    /// interleaving), and for tests that inspect invariants.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SchedulerState) -> R) -> R {
        f(&mut self.state.lock())
    }
}

impl Default for LotteryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facade_round_trip() {
        let sched = LotteryScheduler::new();
        let q = sched.create_queue(true);
        let e = EntityId::new(1);
        sched.wait_for_access(q, e).unwrap();
        assert!(sched.contains(q, e).unwrap());
        assert_eq!(sched.queue_len(q).unwrap(), 1);
        assert_eq!(sched.next_thread(q).unwrap(), Some(e));
        assert_eq!(sched.owner(q).unwrap(), Some(e));
        sched.with_state(|state| state.check_invariants());
    }

    #[test]
    fn with_state_groups_calls_atomically() {
        let sched = LotteryScheduler::with_seed(99);
        let winner = sched.with_state(|state| {
            let q = state.create_queue(false);
            state.wait_for_access(q, EntityId::new(1)).unwrap();
            state.wait_for_access(q, EntityId::new(2)).unwrap();
            state.next_thread(q).unwrap()
        });
        assert!(winner.is_some());
    }
}

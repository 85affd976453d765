//! Scheduler registry: the entity table, the queue arena, and donation
//! propagation.
//!
//! All scheduler semantics live here, expressed as `&mut self` operations
//! keyed by ids (entities in a lazily populated map, queues in an arena).
//! The [`super::LotteryScheduler`] facade wraps this state in a mutex to
//! provide the exclusion discipline; tests drive the state directly for
//! single-threaded scenarios.
//!
//! # Propagation
//!
//! Any base-priority or ownership change recomputes the affected entity's
//! effective priority. When the value actually changed, the entity's stored
//! contribution in the queue it waits in is refreshed (dirtying that queue's
//! sum) and, when that queue donates, its owner is recomputed in turn. The
//! cascade terminates because the wait/own graph is kept acyclic and every
//! hop requires a real value change.
//!
//! # Acyclicity
//!
//! The wait/own graph is kept acyclic procedurally: `wait_for_access`
//! rejects waiting on a queue the entity transitively owns, and `acquire`
//! rejects taking a queue the entity transitively waits behind.

use crate::error::{Result, SchedError};
use crate::sched::entity::EntityState;
use crate::sched::queue::QueueRecord;
use crate::types::{EntityId, QueueId, Tickets, MAX_PRIORITY, MIN_PRIORITY};
use crate::util::{Arena, DetRng};
use std::collections::HashMap;
use tracing::{debug, trace};

/// The complete mutable state of one scheduler instance.
///
/// Independent instances are fully isolated; nothing in this crate is a
/// process-wide static.
#[derive(Debug)]
pub struct SchedulerState {
    entities: HashMap<EntityId, EntityState>,
    queues: Arena<QueueRecord>,
    rng: DetRng,
}

impl SchedulerState {
    /// Creates an empty registry whose lottery draws come from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            entities: HashMap::new(),
            queues: Arena::new(),
            rng: DetRng::new(seed),
        }
    }

    // === Queues ===

    /// Creates a resource queue. `donation` is fixed for the queue's life.
    pub fn create_queue(&mut self, donation: bool) -> QueueId {
        let id = QueueId::from_arena(self.queues.insert(QueueRecord::new(donation)));
        debug!(queue = %id, donation, "queue created");
        id
    }

    /// Enqueues `entity` as a waiter on `queue`.
    ///
    /// The entity's ticket contribution is its effective priority when the
    /// queue donates, its raw base priority otherwise. Fails if the entity
    /// is already waiting somewhere, already a member of this queue, or
    /// transitively owns this queue (which would close a cycle).
    pub fn wait_for_access(&mut self, queue: QueueId, entity: EntityId) -> Result<()> {
        let (donation, owner) = {
            let record = self.queue(queue)?;
            (record.donation(), record.owner())
        };
        if self.queue(queue)?.contains(entity) {
            return Err(SchedError::AlreadyQueued { entity, queue });
        }
        if let Some(current) = self.entity_mut(entity).waiting_on() {
            return Err(SchedError::AlreadyWaiting {
                entity,
                queue: current,
            });
        }
        if self.owner_chain_reaches(queue, entity) {
            return Err(SchedError::OwnershipCycle { entity, queue });
        }

        let tickets = if donation {
            self.effective_priority(entity)
        } else {
            self.entity_mut(entity).base()
        };
        self.queue_mut(queue)?.enqueue(entity, tickets);
        self.entity_mut(entity).set_waiting(Some(queue));
        debug!(queue = %queue, entity = %entity, tickets, "waiter enqueued");

        if donation {
            if let Some(owner) = owner {
                self.propagate(owner, false);
            }
        }
        Ok(())
    }

    /// Makes `entity` the owner of `queue`.
    ///
    /// The previous owner, if any, is released first (and recomputed, since
    /// it loses this queue's donations). If the entity is a waiter on this
    /// queue it is dequeued before taking ownership. Fails only when the
    /// acquisition would close a wait/own cycle through another queue.
    pub fn acquire(&mut self, queue: QueueId, entity: EntityId) -> Result<()> {
        self.queue(queue)?;
        if self.wait_chain_reaches(entity, queue) {
            return Err(SchedError::OwnershipCycle { entity, queue });
        }

        if self.queue_mut(queue)?.dequeue(entity).is_some() {
            self.entity_mut(entity).set_waiting(None);
        }

        if let Some(previous) = self.queue_mut(queue)?.take_owner() {
            self.entity_mut(previous).remove_owned(queue);
            if previous != entity {
                debug!(queue = %queue, entity = %previous, "previous owner released");
                self.propagate(previous, false);
            }
        }

        self.queue_mut(queue)?.set_owner(Some(entity));
        self.entity_mut(entity).add_owned(queue);
        debug!(queue = %queue, entity = %entity, "ownership acquired");
        self.propagate(entity, false);
        Ok(())
    }

    /// Releases `queue`'s current ownership without selecting a successor.
    pub fn release(&mut self, queue: QueueId) -> Result<()> {
        self.queue(queue)?;
        if let Some(previous) = self.queue_mut(queue)?.take_owner() {
            self.entity_mut(previous).remove_owned(queue);
            debug!(queue = %queue, entity = %previous, "ownership released");
            self.propagate(previous, false);
        }
        Ok(())
    }

    /// Runs the lottery on `queue` and hands ownership to the winner.
    ///
    /// With no waiters (or a zero pot) any current ownership is released
    /// and no winner is returned.
    pub fn next_thread(&mut self, queue: QueueId) -> Result<Option<EntityId>> {
        let sum = self.ticket_sum(queue)?;
        if sum == 0 || self.queue(queue)?.is_empty() {
            self.release(queue)?;
            return Ok(None);
        }
        let draw = self.rng.next_ticket(sum);
        let winner = self.queue(queue)?.pick(draw);
        debug!(queue = %queue, draw, sum, winner = ?winner, "lottery held");
        match winner {
            Some(winner) => {
                self.acquire(queue, winner)?;
                Ok(Some(winner))
            }
            None => {
                self.release(queue)?;
                Ok(None)
            }
        }
    }

    /// Resolves an explicit draw value against `queue` without running the
    /// RNG or transferring ownership.
    ///
    /// `draw` is interpreted in `[1, ticket_sum]`; out-of-range draws yield
    /// no winner. This is the deterministic half of [`Self::next_thread`],
    /// exposed so callers and tests can pin draws.
    pub fn winner_for_draw(&mut self, queue: QueueId, draw: Tickets) -> Result<Option<EntityId>> {
        let sum = self.ticket_sum(queue)?;
        if draw == 0 || draw > sum {
            return Ok(None);
        }
        Ok(self.queue(queue)?.pick(draw))
    }

    /// Returns `queue`'s ticket sum, recomputing the cache if dirty.
    pub fn ticket_sum(&mut self, queue: QueueId) -> Result<Tickets> {
        Ok(self.queue_mut(queue)?.ticket_sum())
    }

    /// Whether `entity` is currently a waiter on `queue`.
    pub fn contains(&self, queue: QueueId, entity: EntityId) -> Result<bool> {
        Ok(self.queue(queue)?.contains(entity))
    }

    /// Whether `queue` has no waiters.
    pub fn is_empty(&self, queue: QueueId) -> Result<bool> {
        Ok(self.queue(queue)?.is_empty())
    }

    /// The number of waiters on `queue`.
    pub fn queue_len(&self, queue: QueueId) -> Result<usize> {
        Ok(self.queue(queue)?.len())
    }

    /// The current owner of `queue`, if any.
    pub fn owner(&self, queue: QueueId) -> Result<Option<EntityId>> {
        Ok(self.queue(queue)?.owner())
    }

    // === Priorities ===

    /// Returns `entity`'s raw base priority, creating default state on
    /// first reference.
    pub fn priority(&mut self, entity: EntityId) -> Tickets {
        self.entity_mut(entity).base()
    }

    /// Returns `entity`'s effective priority, recomputing first if the
    /// cache is stale.
    pub fn effective_priority(&mut self, entity: EntityId) -> Tickets {
        if self.entity_mut(entity).is_stale() {
            self.recompute_effective(entity);
        }
        self.entity_mut(entity).effective()
    }

    /// Sets `entity`'s base priority and propagates the change.
    pub fn set_base_priority(&mut self, entity: EntityId, value: Tickets) -> Result<()> {
        if value < MIN_PRIORITY {
            return Err(SchedError::OutOfRange {
                value,
                min: MIN_PRIORITY,
            });
        }
        let state = self.entity_mut(entity);
        if state.base() == value {
            return Ok(());
        }
        state.set_base(value);
        debug!(entity = %entity, base = value, "base priority set");
        // Force the contribution refresh: when the effective value is
        // pinned at the saturation ceiling, a base change still has to
        // reach a non-donating queue that stores the raw base.
        self.propagate(entity, true);
        Ok(())
    }

    /// Raises `entity`'s base priority by one; `false` at the ceiling.
    pub fn increase_priority(&mut self, entity: EntityId) -> bool {
        let base = self.entity_mut(entity).base();
        if base == MAX_PRIORITY {
            return false;
        }
        self.set_base_priority(entity, base + 1).is_ok()
    }

    /// Lowers `entity`'s base priority by one; `false` at the floor.
    pub fn decrease_priority(&mut self, entity: EntityId) -> bool {
        let base = self.entity_mut(entity).base();
        if base == MIN_PRIORITY {
            return false;
        }
        self.set_base_priority(entity, base - 1).is_ok()
    }

    // === Internals ===

    fn queue(&self, queue: QueueId) -> Result<&QueueRecord> {
        self.queues
            .get(queue.arena_index())
            .ok_or(SchedError::UnknownQueue { queue })
    }

    fn queue_mut(&mut self, queue: QueueId) -> Result<&mut QueueRecord> {
        self.queues
            .get_mut(queue.arena_index())
            .ok_or(SchedError::UnknownQueue { queue })
    }

    fn entity_mut(&mut self, entity: EntityId) -> &mut EntityState {
        self.entities.entry(entity).or_default()
    }

    /// True when following owner → waits-on links from `start` reaches
    /// `target`, i.e. `target` transitively owns `start`.
    fn owner_chain_reaches(&self, start: QueueId, target: EntityId) -> bool {
        let mut queue = start;
        loop {
            let Some(owner) = self.queue(queue).ok().and_then(|q| q.owner()) else {
                return false;
            };
            if owner == target {
                return true;
            }
            let Some(next) = self.entities.get(&owner).and_then(EntityState::waiting_on) else {
                return false;
            };
            queue = next;
        }
    }

    /// True when following waits-on → owner links from `start` reaches
    /// `target`, i.e. `start` transitively waits behind `target`.
    ///
    /// `start`'s own membership in `target` is skipped: `acquire` dequeues
    /// that edge before taking ownership.
    fn wait_chain_reaches(&self, start: EntityId, target: QueueId) -> bool {
        let Some(mut queue) = self.entities.get(&start).and_then(EntityState::waiting_on) else {
            return false;
        };
        if queue == target {
            return false;
        }
        loop {
            let Some(owner) = self.queue(queue).ok().and_then(|q| q.owner()) else {
                return false;
            };
            let Some(next) = self.entities.get(&owner).and_then(EntityState::waiting_on) else {
                return false;
            };
            if next == target {
                return true;
            }
            queue = next;
        }
    }

    /// Recomputes `entity`'s effective priority from its base plus the
    /// ticket sums of the donation-enabled queues it owns, saturating at
    /// the ceiling. Returns whether the cached value changed.
    ///
    /// Owned queues are read, never recursed into: they donate to this
    /// entity, they do not depend on it.
    fn recompute_effective(&mut self, entity: EntityId) -> bool {
        let (base, owned) = {
            let state = self.entity_mut(entity);
            (state.base(), state.owned().to_vec())
        };
        let mut effective = base;
        for queue in owned {
            let donates = self.queue(queue).map(QueueRecord::donation).unwrap_or(false);
            if donates {
                if let Ok(sum) = self.ticket_sum(queue) {
                    effective = effective.saturating_add(sum);
                }
            }
        }
        let state = self.entity_mut(entity);
        let changed = state.is_stale() || state.effective() != effective;
        state.set_effective(effective);
        if changed {
            trace!(entity = %entity, effective, "effective priority recomputed");
        }
        changed
    }

    /// Recomputes `entity` and, when its value changed (or `force` is set),
    /// pushes the new contribution into the queue it waits in and cascades
    /// to that queue's owner when the queue donates.
    fn propagate(&mut self, entity: EntityId, force: bool) {
        let changed = self.recompute_effective(entity);
        if changed || force {
            self.refresh_wait_contribution(entity);
        }
    }

    fn refresh_wait_contribution(&mut self, entity: EntityId) {
        let Some(queue) = self.entity_mut(entity).waiting_on() else {
            return;
        };
        let Ok(record) = self.queue(queue) else {
            return;
        };
        let (donation, owner) = (record.donation(), record.owner());
        let tickets = if donation {
            self.entity_mut(entity).effective()
        } else {
            self.entity_mut(entity).base()
        };
        if let Ok(record) = self.queue_mut(queue) {
            record.update_contribution(entity, tickets);
        }
        trace!(queue = %queue, entity = %entity, tickets, "wait contribution refreshed");
        if donation {
            if let Some(owner) = owner {
                if owner != entity {
                    self.propagate(owner, false);
                }
            }
        }
    }

    // === Test support ===

    /// All live queue handles, in slot order. Test and diagnostics aid.
    #[must_use]
    pub fn queue_ids(&self) -> Vec<QueueId> {
        self.queues
            .iter()
            .map(|(index, _)| QueueId::from_arena(index))
            .collect()
    }

    /// Walks every queue and entity and panics on any broken invariant:
    /// clean sum caches must match the true waiter sums, contributions must
    /// respect the minimum, effective priority must dominate base, and the
    /// wait/own cross-references must agree. Intended for tests.
    pub fn check_invariants(&self) {
        for (index, record) in self.queues.iter() {
            let queue = QueueId::from_arena(index);
            if let Some(cached) = record.cached_sum() {
                assert_eq!(
                    cached,
                    record.true_sum(),
                    "{queue}: clean cache diverged from true sum"
                );
            }
            for (entity, tickets) in record.waiters() {
                assert!(
                    *tickets >= MIN_PRIORITY,
                    "{queue}: waiter {entity} holds {tickets} tickets"
                );
                let waiting_on = self.entities.get(entity).and_then(EntityState::waiting_on);
                assert_eq!(
                    waiting_on,
                    Some(queue),
                    "{queue}: waiter {entity} does not point back at the queue"
                );
            }
            if let Some(owner) = record.owner() {
                let owns = self
                    .entities
                    .get(&owner)
                    .is_some_and(|state| state.owned().contains(&queue));
                assert!(owns, "{queue}: owner {owner} does not record ownership");
                assert!(
                    !record.contains(owner),
                    "{queue}: owner {owner} still waits on its own queue"
                );
            }
        }
        for (entity, state) in &self.entities {
            if !state.is_stale() {
                assert!(
                    state.effective() >= state.base(),
                    "{entity}: effective below base"
                );
            }
            for queue in state.owned() {
                let owner = self.queue(*queue).ok().and_then(|q| q.owner());
                assert_eq!(
                    owner,
                    Some(*entity),
                    "{entity}: owned {queue} does not point back"
                );
            }
            if let Some(queue) = state.waiting_on() {
                let member = self.queue(queue).map(|q| q.contains(*entity));
                assert_eq!(
                    member,
                    Ok(true),
                    "{entity}: waiting on {queue} without membership"
                );
            }
        }
    }
}

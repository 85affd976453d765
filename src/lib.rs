//! Raffle: a ticket-based lottery scheduler with transitive priority donation.
//!
//! # Overview
//!
//! Every schedulable entity holds a number of lottery tickets equal to its
//! priority. When a resource queue needs a new owner, a weighted lottery is
//! held over all waiting entities; each waiter's chance of winning is
//! proportional to its ticket share. Queues created with donation enabled
//! mitigate priority inversion: waiters' tickets are added to the current
//! owner's effective priority, transitively along the wait/own chain.
//!
//! # Core guarantees
//!
//! - **Effective dominates base**: an entity's effective priority never
//!   falls below its base priority; donated sums saturate, never wrap.
//! - **Acyclic ownership**: wait and acquire operations that would make the
//!   wait/own graph cyclic are rejected up front.
//! - **Sum-cache correctness**: a queue's cached ticket sum is marked dirty
//!   on every mutation path and recomputed on read.
//! - **Deterministic draws**: lotteries are driven by a seeded generator, so
//!   a seed plus an operation sequence reproduces the same winners.
//! - **Atomic operations**: the public handle serializes all operations
//!   through one lock; none interleaves partially with another.
//!
//! # Module structure
//!
//! - [`types`]: identifiers and ticket arithmetic
//! - [`sched`]: entity state, resource queues, registry, and the public handle
//! - [`error`]: typed operation errors
//! - [`util`]: arena storage and the deterministic RNG
//! - [`test_utils`]: logging and assertion helpers for tests
//!
//! # Example
//!
//! ```
//! use raffle::{EntityId, LotteryScheduler};
//!
//! let sched = LotteryScheduler::with_seed(42);
//! let queue = sched.create_queue(true);
//! let (a, b) = (EntityId::new(1), EntityId::new(2));
//!
//! sched.acquire(queue, a)?;
//! sched.set_base_priority(b, 5)?;
//! sched.wait_for_access(queue, b)?;
//! // b donates its 5 tickets to the owner
//! assert_eq!(sched.effective_priority(a), 6);
//! # Ok::<(), raffle::SchedError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

pub mod error;
pub mod sched;
pub mod test_utils;
pub mod types;
pub mod util;

pub use error::{Result, SchedError};
pub use sched::{LotteryScheduler, SchedulerState, DEFAULT_SEED};
pub use types::{EntityId, QueueId, Tickets, DEFAULT_PRIORITY, MAX_PRIORITY, MIN_PRIORITY};

//! Internal utilities: arena storage and the deterministic RNG.
//!
//! Both are intentionally dependency-free so scheduler behavior is fully
//! determined by the seed and the operation sequence.

pub mod arena;
pub mod det_rng;

pub use arena::{Arena, ArenaIndex};
pub use det_rng::DetRng;

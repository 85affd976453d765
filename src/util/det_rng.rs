//! Deterministic pseudo-random number generator for lottery draws.
//!
//! The scheduler owns one seeded generator; the same seed and the same
//! operation sequence reproduce the same winners, which is what the
//! fairness and determinism tests rely on. xorshift64 keeps this
//! dependency-free and fast. It is NOT cryptographically secure, and the
//! scheduler makes no randomness promise beyond uniform weighted selection.

/// A deterministic xorshift64 generator.
#[derive(Debug, Clone)]
pub struct DetRng {
    state: u64,
}

impl DetRng {
    /// Creates a generator from a seed.
    ///
    /// xorshift has a fixed point at zero, so a zero seed is replaced with 1.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    /// Advances the generator and returns the next value.
    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Draws a ticket number uniformly from `[1, bound]`.
    ///
    /// # Panics
    ///
    /// Panics if `bound` is zero; the lottery never draws from an empty pot.
    pub fn next_ticket(&mut self, bound: u64) -> u64 {
        assert!(bound > 0, "ticket draw requires a non-empty pot");
        1 + self.next_u64() % bound
    }
}

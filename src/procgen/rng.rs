//! Seeded random source threaded through tree generation

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Deterministic RNG for tree generation.
///
/// Every draw made while building a tree goes through one instance, in
/// breadth-first work-queue order, so a seed fully determines the tree.
#[derive(Clone, Debug)]
pub struct TreeRng {
    inner: Pcg32,
}

impl TreeRng {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    /// Generate f32 in range [min, max)
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.inner.random::<f32>() * (max - min)
    }

    /// Generate f32 in range [0, 1)
    pub fn next_float(&mut self) -> f32 {
        self.inner.random::<f32>()
    }
}

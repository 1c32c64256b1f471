//! Injectable randomness for the cognitive protocols
//!
//! Trial delays, card shuffles and stimulus sequences all draw from a
//! [`RandomSource`], so a protocol can be replayed exactly by seeding it or by
//! scripting the draws in tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the random draws a protocol needs
pub trait RandomSource {
    /// Uniform integer in `[0, upper)`. `upper` must be non-zero.
    fn below(&mut self, upper: u32) -> u32;

    /// `true` with the given probability
    fn chance(&mut self, probability: f64) -> bool;

    /// Uniform integer in `[low, high)`
    fn between(&mut self, low: u32, high: u32) -> u32 {
        low + self.below(high - low)
    }

    /// Fisher-Yates shuffle driven by this source
    fn shuffle<T>(&mut self, items: &mut [T])
    where
        Self: Sized,
    {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

/// [`RandomSource`] backed by any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Deterministic source for reproducible sessions
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Source seeded from operating-system entropy
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn below(&mut self, upper: u32) -> u32 {
        self.rng.gen_range(0..upper)
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }
}

/// Scripted source for protocol tests: replays fixed draws in order
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct ScriptedSource {
    pub draws: std::collections::VecDeque<u32>,
    pub chances: std::collections::VecDeque<bool>,
}

#[cfg(test)]
impl ScriptedSource {
    pub fn new(draws: &[u32], chances: &[bool]) -> Self {
        Self {
            draws: draws.iter().copied().collect(),
            chances: chances.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
impl RandomSource for ScriptedSource {
    fn below(&mut self, upper: u32) -> u32 {
        self.draws.pop_front().unwrap_or(0) % upper
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.chances.pop_front().unwrap_or(false)
    }
}

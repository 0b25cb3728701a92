#![forbid(unsafe_code)]

//! Injectable random sources.
//!
//! Every randomized controller draws through [`RandomSource`] so that tests
//! can replay an exact sequence with [`ScriptedRandom`] and assert the
//! resulting state, while the showcase uses [`SeededRandom`].
//!
//! # Invariants
//!
//! 1. [`RandomSource::next_unit`] returns a value in `[0.0, 1.0)`.
//! 2. [`RandomSource::uniform`] returns a value in `[lo, hi)` (or `lo` when
//!    the range is empty).
//! 3. [`RandomSource::chance`] with `p <= 0.0` never hits; with `p >= 1.0`
//!    always hits.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of uniformly distributed values in `[0.0, 1.0)`.
pub trait RandomSource {
    /// Next raw draw in `[0.0, 1.0)`.
    fn next_unit(&mut self) -> f64;

    /// Uniform draw in `[lo, hi)`.
    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return lo;
        }
        lo + self.next_unit() * (hi - lo)
    }

    /// Uniform integer draw in `[lo, hi]` (inclusive on both ends).
    fn uniform_inclusive(&mut self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        let span = (hi - lo + 1) as f64;
        let offset = (self.next_unit() * span).floor() as u64;
        lo + offset.min(hi - lo)
    }

    /// Bernoulli trial: `true` with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_unit() < p
    }

    /// Pick an index into a collection of `len` items. `len` must be non-zero.
    fn pick(&mut self, len: usize) -> usize {
        debug_assert!(len > 0, "pick from empty collection");
        let idx = (self.next_unit() * len as f64).floor() as usize;
        idx.min(len.saturating_sub(1))
    }

    /// An independent source for `stream`.
    ///
    /// Forking never advances `self`, and forks of the same source with the
    /// same stream id replay identical draws.
    fn fork(&self, stream: u64) -> Box<dyn RandomSource>;
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }

    fn fork(&self, stream: u64) -> Box<dyn RandomSource> {
        (**self).fork(stream)
    }
}

/// SplitMix64 finalizer; spreads `seed ^ stream` over all 64 bits.
fn mix(seed: u64, stream: u64) -> u64 {
    const GOLDEN: u64 = 0x9E37_79B9_7F4A_7C15;
    let mut z = (seed ^ stream.wrapping_mul(GOLDEN)).wrapping_add(GOLDEN);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Production random source backed by [`StdRng`].
#[derive(Debug, Clone)]
pub struct SeededRandom {
    seed: u64,
    rng: StdRng,
}

impl SeededRandom {
    /// Deterministic source from a fixed seed.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// The seed this source was built from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn fork(&self, stream: u64) -> Box<dyn RandomSource> {
        Box::new(Self::from_seed(mix(self.seed, stream)))
    }
}

/// Replays a fixed list of draws, then repeats `fallback` forever.
///
/// Values are clamped into `[0.0, 1.0)` on construction so a script cannot
/// break the [`RandomSource`] contract.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    queue: VecDeque<f64>,
    fallback: f64,
    drawn: usize,
}

/// Largest `f64` strictly below 1.0.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

impl ScriptedRandom {
    /// Script the given draws; once exhausted every draw returns `0.5`.
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            queue: values.into_iter().map(|v| v.clamp(0.0, BELOW_ONE)).collect(),
            fallback: 0.5,
            drawn: 0,
        }
    }

    /// A source that always returns `value`.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new([]).with_fallback(value)
    }

    /// Set the value returned once the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, value: f64) -> Self {
        self.fallback = value.clamp(0.0, BELOW_ONE);
        self
    }

    /// Append more scripted draws.
    pub fn push(&mut self, value: f64) {
        self.queue.push_back(value.clamp(0.0, BELOW_ONE));
    }

    /// Number of scripted draws not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Total draws taken so far, scripted or fallback.
    #[must_use]
    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.drawn += 1;
        self.queue.pop_front().unwrap_or(self.fallback)
    }

    /// Every fork replays the remaining script from the start.
    fn fork(&self, _stream: u64) -> Box<dyn RandomSource> {
        Box::new(Self {
            queue: self.queue.clone(),
            fallback: self.fallback,
            drawn: 0,
        })
    }
}

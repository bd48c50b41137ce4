//! The shared random-number stream.
//!
//! A single seeded generator is threaded through the whole turn: the AI's
//! operation sweep draws first, then movement assignment, then the combat
//! resolver. Determinism for a fixed seed depends on that consumption order,
//! so every component takes `&mut GameRng` rather than owning a stream.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Wraps a `SmallRng` behind the two draw shapes the simulation uses.
#[derive(Debug, Clone)]
pub struct GameRng {
    inner: SmallRng,
}

impl GameRng {
    /// Creates a deterministic stream from a seed.
    pub fn seeded(seed: u64) -> Self {
        GameRng {
            inner: SmallRng::seed_from_u64(seed),
        }
    }

    /// Creates a stream seeded from OS entropy.
    pub fn from_entropy() -> Self {
        GameRng {
            inner: SmallRng::from_entropy(),
        }
    }

    /// Uniform integer in `[min, max]` inclusive.
    pub fn roll_int(&mut self, min: i32, max: i32) -> i32 {
        self.inner.gen_range(min..=max)
    }

    /// Uniform float in `[0, 1)`.
    pub fn roll_float01(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }
}

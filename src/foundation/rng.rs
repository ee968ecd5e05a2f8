//! Deterministic numeric primitives shared by the engine and blueprints.
//!
//! The generator is a small linear congruential generator with integer state, so identical seeds
//! yield identical sequences on every platform.

use crate::foundation::math::Fnv1a64;

const LCG_MUL: u64 = 9301;
const LCG_INC: u64 = 49297;
const LCG_MOD: u64 = 233_280;

/// Seeded pseudo-random generator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    /// Create a generator from `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MOD,
        }
    }

    /// Derive the generator a clip sees at `tick`.
    ///
    /// The result depends only on `(job_seed, clip_id, tick)`, never on how many numbers other
    /// clips or earlier ticks consumed, so any worker rendering `tick` reproduces it.
    pub fn for_clip(job_seed: u64, clip_id: &str, tick: u64) -> Self {
        let mut h = Fnv1a64::new_default();
        h.write_u64(job_seed);
        h.write_str(clip_id);
        h.write_u64(tick);
        Self::new(h.finish())
    }

    /// Next value in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.state = (self.state * LCG_MUL + LCG_INC) % LCG_MOD;
        self.state as f64 / LCG_MOD as f64
    }

    /// Next value in `[min, max)`.
    pub fn range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_f64() * (max - min)
    }
}

/// Linear interpolation; `t` is not clamped.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Clamp `v` into `[min, max]`. Never panics; with `min > max` the result is `min`.
pub fn clamp(v: f64, min: f64, max: f64) -> f64 {
    v.min(max).max(min)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/rng.rs"]
mod tests;

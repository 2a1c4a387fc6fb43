//! GPS noise simulation.
//!
//! Samples points uniformly by area inside a disk around a base coordinate:
//! angle ~ U(0, 2π), radius ~ sqrt(U(0, 1)) · r. Taking the square root of the
//! radial sample keeps the density flat instead of clustering at the center.

use std::f64::consts::TAU;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo::{offset_meters, Coordinate};

/// Random jitter source.
#[derive(Debug, Clone)]
pub struct JitterSampler {
    rng: StdRng,
}

impl JitterSampler {
    /// Sampler seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic sampler, for reproducible runs and tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw a point within `radius_m` metres of `base`.
    pub fn sample(&mut self, base: Coordinate, radius_m: f64) -> Coordinate {
        if radius_m <= 0.0 {
            return base;
        }
        let angle = self.rng.random::<f64>() * TAU;
        let r = self.rng.random::<f64>().sqrt() * radius_m;
        offset_meters(base, r * angle.cos(), r * angle.sin())
    }
}

impl Default for JitterSampler {
    fn default() -> Self {
        Self::new()
    }
}

//! Miscellaneous utilities shared across the crate.

use nalgebra::{Matrix3, Vector3};
use rand::distributions::uniform::SampleUniform;
use rand::distributions::Uniform;
use rand::prelude::*;

/// Uniform integer random-number generator drawing unique index sets.
///
/// By default this uses an entropy-seeded RNG, but test code can construct it
/// from a fixed seed for reproducible behavior.
#[derive(Clone, Debug)]
pub struct UniformRandomGenerator {
    rng: StdRng,
}

impl Default for UniformRandomGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformRandomGenerator {
    /// Construct with a random seed (suitable for production use).
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Construct with a fixed seed (useful for tests).
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fill `out` with distinct values drawn uniformly from `[min, max]`.
    ///
    /// Rejection sampling; meant for the small sample sizes of minimal
    /// solvers. The caller must ensure the range holds at least `out.len()`
    /// values.
    pub fn gen_unique<T>(&mut self, out: &mut [T], min: T, max: T)
    where
        T: SampleUniform + PartialOrd + Copy,
    {
        let dist = Uniform::new_inclusive(min, max);
        for i in 0..out.len() {
            loop {
                let candidate = dist.sample(&mut self.rng);
                if out[..i].iter().all(|&v| v != candidate) {
                    out[i] = candidate;
                    break;
                }
            }
        }
    }
}

/// Skew-symmetric matrix `[v]x` such that `[v]x * w == v.cross(&w)`.
pub fn cross_product_matrix(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(0.0, -v.z, v.y, v.z, 0.0, -v.x, -v.y, v.x, 0.0)
}

/// Vector `v` such that `[v]x` is the skew-symmetric part of `m`.
pub fn skew_vector(m: &Matrix3<f64>) -> Vector3<f64> {
    0.5 * Vector3::new(
        m[(2, 1)] - m[(1, 2)],
        m[(0, 2)] - m[(2, 0)],
        m[(1, 0)] - m[(0, 1)],
    )
}

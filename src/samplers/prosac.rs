//! PROSAC sampler: progressively grows the subset of high-priority points.
//!
//! Correspondences are expected to be sorted by decreasing quality (e.g.
//! descriptor match score). Early samples come from the best few points; the
//! subset grows following the PROSAC growth function until, after
//! `ransac_convergence_iterations` samples, sampling is uniform over all points.
//!
//! While the subset is growing, every sample contains the newest point of the
//! subset and draws the rest from the points before it.

use crate::core::Sampler;
use crate::utils::UniformRandomGenerator;

/// PROSAC sampler: progressively grows the subset of high-priority points.
#[derive(Clone, Debug)]
pub struct ProsacSampler {
    rng: UniformRandomGenerator,
    growth_function: Vec<usize>,
    sample_size: usize,
    point_number: usize,
    ransac_convergence_iterations: usize,
    kth_sample_number: usize,
    subset_size: usize,
}

impl Default for ProsacSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProsacSampler {
    /// Construct with a default number of PROSAC iterations before falling back to RANSAC.
    pub fn new() -> Self {
        Self::with_rng(UniformRandomGenerator::new(), 100_000)
    }

    /// Construct from a fixed RNG seed.
    pub fn from_seed(seed: u64, ransac_convergence_iterations: usize) -> Self {
        Self::with_rng(
            UniformRandomGenerator::from_seed(seed),
            ransac_convergence_iterations,
        )
    }

    fn with_rng(rng: UniformRandomGenerator, ransac_convergence_iterations: usize) -> Self {
        Self {
            rng,
            growth_function: Vec::new(),
            sample_size: 0,
            point_number: 0,
            ransac_convergence_iterations,
            kth_sample_number: 1,
            subset_size: 0,
        }
    }

    /// Number of leading points the next sample is drawn from.
    pub fn subset_size(&self) -> usize {
        if self.kth_sample_number > self.ransac_convergence_iterations {
            self.point_number
        } else {
            self.subset_size
        }
    }

    fn initialize(&mut self, point_number: usize, sample_size: usize) {
        self.point_number = point_number;
        self.sample_size = sample_size;
        self.kth_sample_number = 1;
        self.growth_function.clear();
        self.growth_function.resize(point_number, 0);

        let mut t_n = self.ransac_convergence_iterations as f64;
        for i in 0..sample_size {
            t_n *= (sample_size - i) as f64 / (point_number - i) as f64;
        }

        let mut t_n_prime: usize = 1;
        for i in 0..point_number {
            if i < sample_size {
                self.growth_function[i] = t_n_prime;
                continue;
            }
            let t_n_plus1 = (i + 1) as f64 * t_n / (i + 1 - sample_size) as f64;
            self.growth_function[i] = t_n_prime + ((t_n_plus1 - t_n).ceil() as usize);
            t_n = t_n_plus1;
            t_n_prime = self.growth_function[i];
        }

        self.subset_size = sample_size;
    }

    fn increment_iteration_number(&mut self) {
        self.kth_sample_number += 1;

        if self.kth_sample_number <= self.ransac_convergence_iterations
            && self.kth_sample_number > self.growth_function[self.subset_size - 1]
        {
            self.subset_size = (self.subset_size + 1).min(self.point_number);
        }
    }
}

impl Sampler for ProsacSampler {
    fn sample(&mut self, num_points: usize, out_indices: &mut [usize]) -> bool {
        let sample_size = out_indices.len();
        if sample_size == 0 || sample_size > num_points {
            return false;
        }

        if self.sample_size != sample_size || self.point_number != num_points {
            self.initialize(num_points, sample_size);
        }

        let upper = self.subset_size();
        if self.kth_sample_number > self.ransac_convergence_iterations || upper == sample_size {
            self.rng.gen_unique(out_indices, 0, upper - 1);
        } else {
            let (rest, newest) = out_indices.split_at_mut(sample_size - 1);
            self.rng.gen_unique(rest, 0, upper - 2);
            newest[0] = upper - 1;
        }

        self.increment_iteration_number();
        true
    }
}

//! Exhaustive sampler enumerating every index combination once.

use crate::core::Sampler;

/// Deterministic sampler visiting all `C(n, k)` combinations in
/// lexicographic order, then reporting exhaustion.
#[derive(Clone, Debug, Default)]
pub struct ExhaustiveSampler {
    current: Vec<usize>,
    num_points: usize,
    exhausted: bool,
}

impl ExhaustiveSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct samples this sampler will produce.
    pub fn num_combinations(num_points: usize, sample_size: usize) -> usize {
        if sample_size > num_points {
            return 0;
        }
        let k = sample_size.min(num_points - sample_size);
        let mut total: u128 = 1;
        for i in 0..k {
            total = match total.checked_mul((num_points - i) as u128) {
                Some(v) => v / (i as u128 + 1),
                None => return usize::MAX,
            };
        }
        usize::try_from(total).unwrap_or(usize::MAX)
    }

    fn advance(&mut self) -> bool {
        let k = self.current.len();
        let n = self.num_points;
        let Some(pivot) = (0..k).rev().find(|&i| self.current[i] < n - k + i) else {
            return false;
        };
        self.current[pivot] += 1;
        for j in (pivot + 1)..k {
            self.current[j] = self.current[j - 1] + 1;
        }
        true
    }
}

impl Sampler for ExhaustiveSampler {
    fn sample(&mut self, num_points: usize, out_indices: &mut [usize]) -> bool {
        let sample_size = out_indices.len();
        if sample_size == 0 || sample_size > num_points {
            return false;
        }

        if self.current.len() != sample_size || self.num_points != num_points {
            self.num_points = num_points;
            self.current = (0..sample_size).collect();
            self.exhausted = false;
        } else if self.exhausted || !self.advance() {
            self.exhausted = true;
            return false;
        }

        out_indices.copy_from_slice(&self.current);
        true
    }
}

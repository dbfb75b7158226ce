//! Scoring primitives.
//!
//! Scoring turns the per-correspondence residuals of one model into a
//! comparable [`Score`] and the list of inliers. Residuals that are not finite
//! are never inliers.

use crate::core::Scoring;
use std::cmp::Ordering;

/// Model support: an inlier count and a quality value (higher is better).
///
/// Scores compare on `value` only. Callers replace their best model on a
/// strictly greater score, so equal scores keep the first model found.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    pub inlier_count: usize,
    pub value: f64,
}

impl Score {
    pub fn new(inlier_count: usize, value: f64) -> Self {
        Self {
            inlier_count,
            value,
        }
    }

    /// Score of an empty support set.
    pub fn worst() -> Self {
        Self::new(0, f64::NEG_INFINITY)
    }
}

impl Default for Score {
    fn default() -> Self {
        Self::worst()
    }
}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

#[inline]
fn is_inlier(residual: f64, threshold: f64) -> bool {
    residual.is_finite() && residual <= threshold
}

/// RANSAC-style scoring that counts residuals `<= threshold`.
#[derive(Debug, Clone, Copy)]
pub struct InlierCountScoring {
    threshold: f64,
}

impl InlierCountScoring {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Scoring for InlierCountScoring {
    fn score(&self, residuals: &[f64], inliers_out: &mut Vec<usize>) -> Score {
        inliers_out.clear();
        inliers_out.extend(
            residuals
                .iter()
                .enumerate()
                .filter(|&(_, &r)| is_inlier(r, self.threshold))
                .map(|(i, _)| i),
        );

        let inlier_count = inliers_out.len();
        Score::new(inlier_count, inlier_count as f64)
    }
}

/// MSAC scoring: every residual costs `min(r, threshold)`.
///
/// The score value is the negated total cost, so among models with the same
/// inliers the one fitting them more tightly wins.
#[derive(Debug, Clone, Copy)]
pub struct MsacScoring {
    threshold: f64,
}

impl MsacScoring {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Scoring for MsacScoring {
    fn score(&self, residuals: &[f64], inliers_out: &mut Vec<usize>) -> Score {
        inliers_out.clear();

        let mut cost = 0.0;
        for (i, &r) in residuals.iter().enumerate() {
            if is_inlier(r, self.threshold) {
                inliers_out.push(i);
                cost += r;
            } else {
                cost += self.threshold;
            }
        }

        Score::new(inliers_out.len(), -cost)
    }
}

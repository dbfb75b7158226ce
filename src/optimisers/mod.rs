//! Local optimization strategies.
//!
//! After the main loop finds a new best model, a local optimizer tries to
//! improve it using the model's inliers, which are far more numerous than a
//! minimal sample.
//!
//! ## Example: custom refinement
//!
//! ```rust
//! use rigsac::core::{Estimator, Hypothesis, LocalOptimizer, Scoring};
//!
//! /// Re-scores the incoming model and never improves on it.
//! struct Rescore;
//!
//! impl<E: Estimator> LocalOptimizer<E> for Rescore {
//!     fn run(
//!         &mut self,
//!         estimator: &E,
//!         scoring: &dyn Scoring,
//!         points1: &[E::Point1],
//!         points2: &[E::Point2],
//!         best: &Hypothesis<E::Model>,
//!     ) -> Option<Hypothesis<E::Model>> {
//!         let mut residuals = Vec::new();
//!         let mut inliers = Vec::new();
//!         estimator.residuals(points1, points2, &best.model, &mut residuals);
//!         let score = scoring.score(&residuals, &mut inliers);
//!         (score > best.score).then(|| Hypothesis { model: best.model.clone(), score, inliers })
//!     }
//! }
//! ```

use crate::core::{Estimator, Hypothesis, LocalOptimizer, Scoring};

pub mod local;

pub use local::{IteratedLeastSquaresOptimizer, NestedRansacOptimizer};

/// Local optimizer stub used when no refinement is desired.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopLocalOptimizer;

impl<E: Estimator> LocalOptimizer<E> for NoopLocalOptimizer {
    fn run(
        &mut self,
        _estimator: &E,
        _scoring: &dyn Scoring,
        _points1: &[E::Point1],
        _points2: &[E::Point2],
        _best: &Hypothesis<E::Model>,
    ) -> Option<Hypothesis<E::Model>> {
        None
    }
}

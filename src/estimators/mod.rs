//! Estimators for geometric models.
//!
//! Each estimator implements [`Estimator`](crate::core::Estimator): a minimal
//! solver, an optional non-minimal solver used by local optimization, and the
//! residual function used for consensus.

pub mod generalized_relative_pose;

pub use generalized_relative_pose::GeneralizedRelativePoseEstimator;

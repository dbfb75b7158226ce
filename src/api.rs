//! High-level Rust API.
//!
//! These functions assemble a [`LoRansac`] from [`RansacSettings`] through the
//! runtime choice enums, so callers only supply data and configuration.

use crate::choices::{LocalOptimizerChoice, SamplerChoice, ScoringChoice, TerminationChoice};
use crate::core::{Estimator, LoRansac, Report};
use crate::error::RansacError;
use crate::estimators::GeneralizedRelativePoseEstimator;
use crate::models::RigidTransform;
use crate::settings::RansacSettings;
use crate::types::Correspondence;

/// LO-RANSAC pipeline with every component selected at runtime.
pub type ConfiguredRansac<E> =
    LoRansac<E, SamplerChoice, ScoringChoice, LocalOptimizerChoice<E>, TerminationChoice>;

/// Build a pipeline for `estimator` from `settings`.
///
/// Fails with [`RansacError::InvalidSettings`] if the settings do not validate.
pub fn build_ransac<E>(
    estimator: E,
    settings: &RansacSettings,
) -> Result<ConfiguredRansac<E>, RansacError>
where
    E: Estimator,
    E::Model: Default,
{
    LoRansac::new(
        settings.clone(),
        estimator,
        SamplerChoice::from_settings(settings),
        ScoringChoice::from_settings(settings),
        Some(LocalOptimizerChoice::from_settings(settings)),
        TerminationChoice::from_settings(settings),
    )
}

/// Estimate the relative motion `rig2_from_rig1` of a multi-camera rig.
///
/// `points1[i]` and `points2[i]` observe the same 3D point at the two instants;
/// each carries the `cam_from_rig` pose of its sub-camera and a normalized
/// image coordinate. `settings.max_error` bounds the squared Sampson error of
/// an inlier.
///
/// Returns `Err` only for caller mistakes (length mismatch, invalid settings).
/// A failed estimation is reported through `Report::success`.
pub fn estimate_generalized_relative_pose(
    points1: &[Correspondence],
    points2: &[Correspondence],
    settings: &RansacSettings,
) -> Result<Report<RigidTransform>, RansacError> {
    let mut ransac = build_ransac(GeneralizedRelativePoseEstimator::new(), settings)?;
    ransac.estimate(points1, points2)
}

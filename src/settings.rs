//! RANSAC configuration types.
//!
//! A single [`RansacSettings`] value configures one estimation call. The
//! threshold and confidence are fixed for the lifetime of that call; only the
//! trial budget adapts while the loop runs.

use crate::error::SettingsError;

/// Scoring strategy used to evaluate models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScoringType {
    /// Plain inlier counting.
    Ransac,
    /// Truncated residual cost.
    Msac,
}

/// Sampling strategy for minimal sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SamplerType {
    Uniform,
    Prosac,
    Exhaustive,
}

/// Local optimization strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LocalOptimizationType {
    None,
    /// Re-fit on all inliers while the inlier set keeps growing.
    IteratedLsq,
    /// Re-fit on random subsets of the inliers.
    NestedRansac,
}

/// Settings controlling local optimization procedures.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalOptimizationSettings {
    /// Hard cap on refinement rounds per improvement of the best model.
    pub max_iterations: usize,
    /// Nested RANSAC draws `sample_size_multiplier * sample_size` inliers per round.
    pub sample_size_multiplier: usize,
}

impl Default for LocalOptimizationSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            sample_size_multiplier: 2,
        }
    }
}

/// Main configuration object for the LO-RANSAC pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RansacSettings {
    /// Inlier threshold, in the units of the estimator residual.
    pub max_error: f64,
    /// Minimum fraction of inliers for a model to be accepted.
    ///
    /// The required support is `ceil(min_inlier_ratio * N)` but never less
    /// than the estimator's minimal sample size, so ratios below
    /// `sample_size / N` are raised to it.
    pub min_inlier_ratio: f64,
    /// Desired probability of drawing at least one all-inlier sample, in \[0, 1).
    pub confidence: f64,
    /// Minimum number of trials before the adaptive budget may stop the loop.
    pub min_num_trials: usize,
    /// Hard upper bound on the number of trials.
    pub max_num_trials: usize,
    /// Scales the number of trials given by the stopping-time formula.
    pub num_trials_multiplier: f64,

    pub scoring: ScoringType,
    pub sampler: SamplerType,
    pub local_optimization: LocalOptimizationType,
    pub local_optimization_settings: LocalOptimizationSettings,

    /// Seed for every random component; `None` draws one from the OS.
    pub seed: Option<u64>,
}

impl Default for RansacSettings {
    fn default() -> Self {
        Self {
            max_error: 1e-3,
            min_inlier_ratio: 0.1,
            confidence: 0.99,
            min_num_trials: 0,
            max_num_trials: 10_000,
            num_trials_multiplier: 3.0,
            scoring: ScoringType::Ransac,
            sampler: SamplerType::Uniform,
            local_optimization: LocalOptimizationType::IteratedLsq,
            local_optimization_settings: LocalOptimizationSettings::default(),
            seed: None,
        }
    }
}

impl RansacSettings {
    /// Check that the settings describe a terminating, meaningful search.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !self.max_error.is_finite() || self.max_error <= 0.0 {
            return Err(SettingsError::InvalidMaxError(self.max_error));
        }
        if !(0.0..=1.0).contains(&self.min_inlier_ratio) {
            return Err(SettingsError::InvalidMinInlierRatio(self.min_inlier_ratio));
        }
        if !(0.0..1.0).contains(&self.confidence) {
            return Err(SettingsError::InvalidConfidence(self.confidence));
        }
        if self.max_num_trials == 0 {
            return Err(SettingsError::ZeroMaxNumTrials);
        }
        if self.min_num_trials > self.max_num_trials {
            return Err(SettingsError::TrialBoundsInverted {
                min: self.min_num_trials,
                max: self.max_num_trials,
            });
        }
        if !self.num_trials_multiplier.is_finite() || self.num_trials_multiplier <= 0.0 {
            return Err(SettingsError::InvalidTrialsMultiplier(
                self.num_trials_multiplier,
            ));
        }
        if self.local_optimization != LocalOptimizationType::None
            && self.local_optimization_settings.max_iterations == 0
        {
            return Err(SettingsError::ZeroLocalIterations);
        }
        Ok(())
    }
}

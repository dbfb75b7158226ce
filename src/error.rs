/// Configuration values rejected by [`RansacSettings::validate`](crate::settings::RansacSettings::validate).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// The inlier threshold must be finite and strictly positive.
    #[error("max_error must be finite and > 0, got {0}")]
    InvalidMaxError(f64),

    /// The minimum inlier ratio is a fraction.
    #[error("min_inlier_ratio must lie in [0, 1], got {0}")]
    InvalidMinInlierRatio(f64),

    /// A confidence of 1 would require an unbounded number of trials.
    #[error("confidence must lie in [0, 1), got {0}")]
    InvalidConfidence(f64),

    /// At least one trial is needed to produce a model.
    #[error("max_num_trials must be > 0")]
    ZeroMaxNumTrials,

    /// The trial floor cannot exceed the trial ceiling.
    #[error("min_num_trials ({min}) exceeds max_num_trials ({max})")]
    TrialBoundsInverted {
        /// Configured lower bound.
        min: usize,
        /// Configured upper bound.
        max: usize,
    },

    /// The dynamic trial multiplier scales the stopping-time formula.
    #[error("num_trials_multiplier must be finite and > 0, got {0}")]
    InvalidTrialsMultiplier(f64),

    /// Local optimization is enabled but may not iterate.
    #[error("local optimization is enabled with max_iterations = 0")]
    ZeroLocalIterations,
}

/// Errors returned by the robust estimation entry points.
///
/// Only misuse by the caller ends up here. Running out of data, degenerate
/// samples and missing consensus are reported through
/// [`Report::success`](crate::core::Report::success) instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RansacError {
    /// The two correspondence sequences must be index-aligned.
    #[error("points1 and points2 must have the same length, got {points1} and {points2}")]
    MismatchedCorrespondences {
        /// Length of the first sequence.
        points1: usize,
        /// Length of the second sequence.
        points2: usize,
    },

    /// The settings failed validation.
    #[error("invalid RANSAC settings: {0}")]
    InvalidSettings(#[from] SettingsError),
}

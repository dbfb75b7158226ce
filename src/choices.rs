//! Lightweight runtime wrappers exposing built-in components via enums while the
//! core `LoRansac` stays fully generic. Each enum holds the concrete variants
//! selectable from [`RansacSettings`] plus a `Dyn` escape hatch for custom
//! implementations.

use crate::core::{
    Estimator, Hypothesis, LocalOptimizer, RansacTerminationCriterion, Sampler, Scoring,
    TerminationCriterion,
};
use crate::optimisers::{IteratedLeastSquaresOptimizer, NestedRansacOptimizer};
use crate::samplers::{ExhaustiveSampler, ProsacSampler, UniformRandomSampler};
use crate::scoring::{InlierCountScoring, MsacScoring, Score};
use crate::settings::{LocalOptimizationType, RansacSettings, SamplerType, ScoringType};

/// Nested RANSAC draws from a stream separate from the main sampler.
const LOCAL_OPTIMIZER_SEED_OFFSET: u64 = 0x9e37_79b9_7f4a_7c15;

/// Runtime sampler selection.
pub enum SamplerChoice {
    Uniform(UniformRandomSampler),
    Prosac(ProsacSampler),
    Exhaustive(ExhaustiveSampler),
    Dyn(Box<dyn Sampler + Send + Sync>),
}

impl Default for SamplerChoice {
    fn default() -> Self {
        SamplerChoice::Uniform(UniformRandomSampler::new())
    }
}

impl SamplerChoice {
    /// Build the sampler named by `settings.sampler`, seeded from `settings.seed`.
    ///
    /// PROSAC reaches uniform sampling after `max_num_trials` samples.
    pub fn from_settings(settings: &RansacSettings) -> Self {
        match settings.sampler {
            SamplerType::Uniform => SamplerChoice::Uniform(
                settings
                    .seed
                    .map_or_else(UniformRandomSampler::new, UniformRandomSampler::from_seed),
            ),
            SamplerType::Prosac => {
                let seed = settings.seed.unwrap_or_else(rand::random);
                SamplerChoice::Prosac(ProsacSampler::from_seed(seed, settings.max_num_trials))
            }
            SamplerType::Exhaustive => SamplerChoice::Exhaustive(ExhaustiveSampler::new()),
        }
    }
}

impl Sampler for SamplerChoice {
    fn sample(&mut self, num_points: usize, out_indices: &mut [usize]) -> bool {
        match self {
            SamplerChoice::Uniform(s) => s.sample(num_points, out_indices),
            SamplerChoice::Prosac(s) => s.sample(num_points, out_indices),
            SamplerChoice::Exhaustive(s) => s.sample(num_points, out_indices),
            SamplerChoice::Dyn(s) => s.sample(num_points, out_indices),
        }
    }
}

/// Runtime scoring selection.
pub enum ScoringChoice {
    Ransac(InlierCountScoring),
    Msac(MsacScoring),
    Dyn(Box<dyn Scoring + Send + Sync>),
}

impl ScoringChoice {
    /// Build the scoring named by `settings.scoring` with `max_error` as threshold.
    pub fn from_settings(settings: &RansacSettings) -> Self {
        match settings.scoring {
            ScoringType::Ransac => ScoringChoice::Ransac(InlierCountScoring::new(settings.max_error)),
            ScoringType::Msac => ScoringChoice::Msac(MsacScoring::new(settings.max_error)),
        }
    }
}

impl Scoring for ScoringChoice {
    fn score(&self, residuals: &[f64], inliers_out: &mut Vec<usize>) -> Score {
        match self {
            ScoringChoice::Ransac(s) => s.score(residuals, inliers_out),
            ScoringChoice::Msac(s) => s.score(residuals, inliers_out),
            ScoringChoice::Dyn(s) => s.score(residuals, inliers_out),
        }
    }
}

/// Runtime termination selection.
pub enum TerminationChoice {
    Ransac(RansacTerminationCriterion),
    Dyn(Box<dyn TerminationCriterion + Send + Sync>),
}

impl TerminationChoice {
    pub fn from_settings(settings: &RansacSettings) -> Self {
        TerminationChoice::Ransac(RansacTerminationCriterion::from_settings(settings))
    }
}

impl TerminationCriterion for TerminationChoice {
    fn update_budget(
        &mut self,
        best_score: &Score,
        num_points: usize,
        sample_size: usize,
        max_trials: &mut usize,
    ) {
        match self {
            TerminationChoice::Ransac(term) => {
                term.update_budget(best_score, num_points, sample_size, max_trials)
            }
            TerminationChoice::Dyn(term) => {
                term.update_budget(best_score, num_points, sample_size, max_trials)
            }
        }
    }
}

/// Runtime local optimizer selection.
pub enum LocalOptimizerChoice<E: Estimator> {
    None,
    IteratedLsq(IteratedLeastSquaresOptimizer),
    NestedRansac(NestedRansacOptimizer),
    Dyn(Box<dyn LocalOptimizer<E> + Send + Sync>),
}

impl<E: Estimator> LocalOptimizerChoice<E> {
    /// Build the optimizer named by `settings.local_optimization`.
    pub fn from_settings(settings: &RansacSettings) -> Self {
        let lo = &settings.local_optimization_settings;
        match settings.local_optimization {
            LocalOptimizationType::None => LocalOptimizerChoice::None,
            LocalOptimizationType::IteratedLsq => {
                let mut opt = IteratedLeastSquaresOptimizer::new();
                opt.set_max_iterations(lo.max_iterations);
                LocalOptimizerChoice::IteratedLsq(opt)
            }
            LocalOptimizationType::NestedRansac => {
                let mut opt = settings.seed.map_or_else(NestedRansacOptimizer::new, |seed| {
                    NestedRansacOptimizer::from_seed(seed ^ LOCAL_OPTIMIZER_SEED_OFFSET)
                });
                opt.set_max_iterations(lo.max_iterations);
                opt.set_sample_size_multiplier(lo.sample_size_multiplier);
                LocalOptimizerChoice::NestedRansac(opt)
            }
        }
    }
}

impl<E: Estimator> LocalOptimizer<E> for LocalOptimizerChoice<E> {
    fn run(
        &mut self,
        estimator: &E,
        scoring: &dyn Scoring,
        points1: &[E::Point1],
        points2: &[E::Point2],
        best: &Hypothesis<E::Model>,
    ) -> Option<Hypothesis<E::Model>> {
        match self {
            LocalOptimizerChoice::None => None,
            LocalOptimizerChoice::IteratedLsq(opt) => {
                opt.run(estimator, scoring, points1, points2, best)
            }
            LocalOptimizerChoice::NestedRansac(opt) => {
                opt.run(estimator, scoring, points1, points2, best)
            }
            LocalOptimizerChoice::Dyn(opt) => opt.run(estimator, scoring, points1, points2, best),
        }
    }
}

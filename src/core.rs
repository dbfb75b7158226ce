//! Core traits and the LO-RANSAC pipeline.
//!
//! The pipeline is split into small components, each behind a trait:
//! - [`Estimator`]: minimal solver plus residual function for one geometric problem.
//! - [`Sampler`]: draws index sets of the minimal sample size.
//! - [`Scoring`]: turns residuals into a comparable [`Score`] and an inlier set.
//! - [`LocalOptimizer`]: refines the best model from its inliers.
//! - [`TerminationCriterion`]: shrinks the trial budget as support improves.
//!
//! [`LoRansac`] is generic over all of them, so any estimator satisfying the
//! contract plugs in without touching the loop.

use crate::error::RansacError;
use crate::scoring::Score;
use crate::settings::RansacSettings;
use log::{debug, trace};

/// Number of virtual points used to turn `min_inlier_ratio` into the
/// pessimistic initial trial budget.
const PESSIMISTIC_NUM_POINTS: usize = 100_000;

/// Estimator responsible for generating model hypotheses from minimal samples.
///
/// Data comes as two index-aligned sequences: `points1[i]` and `points2[i]`
/// observe the same entity.
pub trait Estimator {
    /// Observation type of the first sequence.
    type Point1: Clone;
    /// Observation type of the second sequence.
    type Point2: Clone;
    /// Model type produced by this estimator.
    type Model: Clone;

    /// Size of a minimal sample for this estimator.
    fn sample_size(&self) -> usize;

    /// Smallest number of points accepted by [`Estimator::estimate_model_nonminimal`].
    fn non_minimal_sample_size(&self) -> usize {
        self.sample_size()
    }

    /// Cheap rejection of samples known to be degenerate before solving.
    fn is_valid_sample(&self, _points1: &[Self::Point1], _points2: &[Self::Point2]) -> bool {
        true
    }

    /// Estimate candidate models from a minimal sample.
    ///
    /// An empty result means the sample was degenerate; it is not an error.
    fn estimate_model(
        &self,
        points1: &[Self::Point1],
        points2: &[Self::Point2],
    ) -> Vec<Self::Model>;

    /// Estimate models from more than the minimal number of points.
    fn estimate_model_nonminimal(
        &self,
        points1: &[Self::Point1],
        points2: &[Self::Point2],
    ) -> Vec<Self::Model> {
        self.estimate_model(points1, points2)
    }

    /// Compute one residual per correspondence pair into `residuals`.
    ///
    /// Residuals must be non-negative and zero for noiseless, consistent data.
    fn residuals(
        &self,
        points1: &[Self::Point1],
        points2: &[Self::Point2],
        model: &Self::Model,
        residuals: &mut Vec<f64>,
    );
}

/// Sampler responsible for drawing minimal samples from the data.
pub trait Sampler {
    /// Draw `out_indices.len()` distinct indices from `[0, num_points)`.
    ///
    /// Returns `false` when no sample can be drawn (too few points, or the
    /// sampler is exhausted); the pipeline then stops.
    fn sample(&mut self, num_points: usize, out_indices: &mut [usize]) -> bool;
}

/// Scoring strategy used to evaluate model quality and determine inliers.
pub trait Scoring {
    /// Score residuals of one model and write the indices of its inliers.
    fn score(&self, residuals: &[f64], inliers_out: &mut Vec<usize>) -> Score;
}

/// A scored model together with its inlier indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Hypothesis<M> {
    pub model: M,
    pub score: Score,
    pub inliers: Vec<usize>,
}

/// Local optimization strategy, refining a model using its inliers.
pub trait LocalOptimizer<E: Estimator> {
    /// Try to improve on `best`.
    ///
    /// Returns the best hypothesis found, or `None` if nothing scored strictly
    /// higher than `best`. Implementations must run a bounded number of rounds.
    fn run(
        &mut self,
        estimator: &E,
        scoring: &dyn Scoring,
        points1: &[E::Point1],
        points2: &[E::Point2],
        best: &Hypothesis<E::Model>,
    ) -> Option<Hypothesis<E::Model>>;
}

/// Termination criterion deciding when the RANSAC loop can stop.
///
/// The loop stops once it has drawn `max_trials` samples (but never fewer
/// than `min_num_trials`).
pub trait TerminationCriterion {
    /// Update the trial budget after the best score improved.
    ///
    /// Implementations may only lower `max_trials`.
    fn update_budget(
        &mut self,
        best_score: &Score,
        num_points: usize,
        sample_size: usize,
        max_trials: &mut usize,
    );
}

/// Number of trials needed to draw one all-inlier sample with probability
/// `confidence`, scaled by `multiplier`.
///
/// Follows `N = log(1 - confidence) / log(1 - inlier_ratio^sample_size)`.
/// Returns `usize::MAX` when the inlier ratio is too small for the formula to
/// be finite and `1` when every point is an inlier.
pub fn compute_num_trials(
    num_inliers: usize,
    num_points: usize,
    sample_size: usize,
    confidence: f64,
    multiplier: f64,
) -> usize {
    if num_points == 0 {
        return usize::MAX;
    }
    let inlier_ratio = (num_inliers as f64 / num_points as f64).clamp(0.0, 1.0);

    let nom = 1.0 - confidence;
    if nom <= 0.0 {
        return usize::MAX;
    }

    let denom = 1.0 - inlier_ratio.powi(sample_size as i32);
    if denom <= 0.0 {
        return 1;
    }
    if denom >= 1.0 {
        return usize::MAX;
    }

    let trials = (nom.ln() / denom.ln() * multiplier).ceil();
    if !trials.is_finite() || trials >= usize::MAX as f64 {
        return usize::MAX;
    }
    (trials as usize).max(1)
}

/// Standard RANSAC termination criterion.
///
/// Recomputes the trial budget from the current best inlier ratio using
/// [`compute_num_trials`] and never lets it grow.
#[derive(Debug, Clone, Copy)]
pub struct RansacTerminationCriterion {
    /// Desired confidence in \[0, 1).
    pub confidence: f64,
    /// Scales the number of trials given by the stopping-time formula.
    pub num_trials_multiplier: f64,
}

impl RansacTerminationCriterion {
    pub fn new(confidence: f64, num_trials_multiplier: f64) -> Self {
        Self {
            confidence,
            num_trials_multiplier,
        }
    }

    pub fn from_settings(settings: &RansacSettings) -> Self {
        Self::new(settings.confidence, settings.num_trials_multiplier)
    }
}

impl TerminationCriterion for RansacTerminationCriterion {
    fn update_budget(
        &mut self,
        best_score: &Score,
        num_points: usize,
        sample_size: usize,
        max_trials: &mut usize,
    ) {
        let required = compute_num_trials(
            best_score.inlier_count,
            num_points,
            sample_size,
            self.confidence,
            self.num_trials_multiplier,
        );
        if required < *max_trials {
            *max_trials = required;
        }
    }
}

/// Outcome of one [`LoRansac::estimate`] call.
#[derive(Debug, Clone, PartialEq)]
pub struct Report<M> {
    /// Whether a model met the minimum inlier ratio.
    pub success: bool,
    /// Best model on success, `M::default()` otherwise.
    pub model: M,
    /// Support of `model`; 0 on failure.
    pub num_inliers: usize,
    /// Per-correspondence inlier flags for `model`.
    pub inlier_mask: Vec<bool>,
    /// Score of `model`.
    pub score: Score,
    /// Number of samples drawn.
    pub num_trials: usize,
    /// On failure, the best hypothesis seen, if any. Not reliable.
    pub rejected: Option<Hypothesis<M>>,
}

impl<M: Default> Report<M> {
    fn failure(num_points: usize) -> Self {
        Self {
            success: false,
            model: M::default(),
            num_inliers: 0,
            inlier_mask: vec![false; num_points],
            score: Score::worst(),
            num_trials: 0,
            rejected: None,
        }
    }
}

/// Generic LO-RANSAC pipeline orchestrating the above components.
///
/// Each call to [`LoRansac::estimate`] keeps its state on the stack; the
/// struct only owns the components. Separate instances can run on separate
/// threads without sharing anything.
#[derive(Debug)]
pub struct LoRansac<E, Sa, Sc, LO, T>
where
    E: Estimator,
    Sa: Sampler,
    Sc: Scoring,
    LO: LocalOptimizer<E>,
    T: TerminationCriterion,
{
    pub settings: RansacSettings,
    pub estimator: E,
    pub sampler: Sa,
    pub scoring: Sc,
    pub local_optimizer: Option<LO>,
    pub termination: T,
}

impl<E, Sa, Sc, LO, T> LoRansac<E, Sa, Sc, LO, T>
where
    E: Estimator,
    E::Model: Default,
    Sa: Sampler,
    Sc: Scoring,
    LO: LocalOptimizer<E>,
    T: TerminationCriterion,
{
    /// Create a new pipeline from its components.
    pub fn new(
        settings: RansacSettings,
        estimator: E,
        sampler: Sa,
        scoring: Sc,
        local_optimizer: Option<LO>,
        termination: T,
    ) -> Result<Self, RansacError> {
        settings.validate()?;
        Ok(Self {
            settings,
            estimator,
            sampler,
            scoring,
            local_optimizer,
            termination,
        })
    }

    /// Robustly estimate a model from two index-aligned correspondence sets.
    ///
    /// Only caller errors are returned as `Err`. Too few points, degenerate
    /// data and missing consensus all end in a report with `success == false`.
    pub fn estimate(
        &mut self,
        points1: &[E::Point1],
        points2: &[E::Point2],
    ) -> Result<Report<E::Model>, RansacError> {
        if points1.len() != points2.len() {
            return Err(RansacError::MismatchedCorrespondences {
                points1: points1.len(),
                points2: points2.len(),
            });
        }

        let num_points = points1.len();
        let sample_size = self.estimator.sample_size();
        let mut report = Report::failure(num_points);

        if sample_size == 0 || num_points < sample_size {
            debug!(
                "need at least {} correspondences, got {}",
                sample_size, num_points
            );
            return Ok(report);
        }

        let min_num_inliers = ((self.settings.min_inlier_ratio * num_points as f64).ceil()
            as usize)
            .max(sample_size);
        let min_num_trials = self.settings.min_num_trials;
        let mut max_num_trials = self.settings.max_num_trials.min(compute_num_trials(
            (self.settings.min_inlier_ratio * PESSIMISTIC_NUM_POINTS as f64) as usize,
            PESSIMISTIC_NUM_POINTS,
            sample_size,
            self.settings.confidence,
            self.settings.num_trials_multiplier,
        ));
        debug!(
            "LO-RANSAC on {} correspondences, sample size {}, initial budget {} trials",
            num_points, sample_size, max_num_trials
        );

        let mut sample = vec![0usize; sample_size];
        let mut subset1 = Vec::with_capacity(sample_size);
        let mut subset2 = Vec::with_capacity(sample_size);
        let mut residuals = Vec::with_capacity(num_points);
        let mut tmp_inliers = Vec::with_capacity(num_points);

        let mut best: Option<Hypothesis<E::Model>> = None;
        let mut num_trials = 0usize;

        while num_trials < max_num_trials.max(min_num_trials) {
            if !self.sampler.sample(num_points, &mut sample) {
                debug!("sampler exhausted after {} trials", num_trials);
                break;
            }
            num_trials += 1;

            subset1.clear();
            subset2.clear();
            subset1.extend(sample.iter().map(|&i| points1[i].clone()));
            subset2.extend(sample.iter().map(|&i| points2[i].clone()));

            if !self.estimator.is_valid_sample(&subset1, &subset2) {
                continue;
            }

            // Every candidate of a multi-valued solver is scored independently.
            let mut improved = false;
            for model in self.estimator.estimate_model(&subset1, &subset2) {
                self.estimator
                    .residuals(points1, points2, &model, &mut residuals);
                let score = self.scoring.score(&residuals, &mut tmp_inliers);

                if best.as_ref().map_or(true, |b| score > b.score) {
                    trace!(
                        "trial {}: new best model with {} inliers",
                        num_trials,
                        score.inlier_count
                    );
                    best = Some(Hypothesis {
                        model,
                        score,
                        inliers: tmp_inliers.clone(),
                    });
                    improved = true;
                }
            }

            if improved {
                let refined = match (self.local_optimizer.as_mut(), best.as_ref()) {
                    (Some(lo), Some(current))
                        if current.score.inlier_count > sample_size
                            && current.score.inlier_count
                                >= self.estimator.non_minimal_sample_size() =>
                    {
                        lo.run(&self.estimator, &self.scoring, points1, points2, current)
                            .filter(|r| r.score > current.score)
                    }
                    _ => None,
                };
                if let Some(refined) = refined {
                    trace!(
                        "trial {}: local optimization raised support to {} inliers",
                        num_trials,
                        refined.score.inlier_count
                    );
                    best = Some(refined);
                }

                if let Some(current) = best.as_ref() {
                    let previous = max_num_trials;
                    self.termination.update_budget(
                        &current.score,
                        num_points,
                        sample_size,
                        &mut max_num_trials,
                    );
                    if max_num_trials < previous {
                        debug!(
                            "inlier ratio {:.3}: trial budget {} -> {}",
                            current.score.inlier_count as f64 / num_points as f64,
                            previous,
                            max_num_trials
                        );
                    }
                }
            }
        }

        report.num_trials = num_trials;
        match best {
            Some(best) if best.score.inlier_count >= min_num_inliers => {
                for &i in &best.inliers {
                    report.inlier_mask[i] = true;
                }
                report.success = true;
                report.num_inliers = best.score.inlier_count;
                report.score = best.score;
                report.model = best.model;
                debug!(
                    "LO-RANSAC succeeded after {} trials with {} / {} inliers",
                    num_trials, report.num_inliers, num_points
                );
            }
            rejected => {
                debug!(
                    "LO-RANSAC failed after {} trials: best support {} below required {}",
                    num_trials,
                    rejected.as_ref().map_or(0, |b| b.score.inlier_count),
                    min_num_inliers
                );
                report.rejected = rejected;
            }
        }

        Ok(report)
    }
}

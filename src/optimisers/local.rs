use crate::core::{Estimator, Hypothesis, LocalOptimizer, Sampler, Scoring};
use crate::samplers::UniformRandomSampler;

/// Fit on `indices` with the non-minimal solver and score every candidate
/// against the full correspondence set. Returns the best candidate.
fn refit<E: Estimator>(
    estimator: &E,
    scoring: &dyn Scoring,
    points1: &[E::Point1],
    points2: &[E::Point2],
    indices: &[usize],
) -> Option<Hypothesis<E::Model>> {
    let sub1: Vec<E::Point1> = indices.iter().map(|&i| points1[i].clone()).collect();
    let sub2: Vec<E::Point2> = indices.iter().map(|&i| points2[i].clone()).collect();

    let mut residuals = Vec::with_capacity(points1.len());
    let mut inliers = Vec::with_capacity(points1.len());
    let mut best: Option<Hypothesis<E::Model>> = None;

    for model in estimator.estimate_model_nonminimal(&sub1, &sub2) {
        estimator.residuals(points1, points2, &model, &mut residuals);
        let score = scoring.score(&residuals, &mut inliers);
        if best.as_ref().map_or(true, |b| score > b.score) {
            best = Some(Hypothesis {
                model,
                score,
                inliers: inliers.clone(),
            });
        }
    }

    best
}

/// Iterated least squares: re-fit on all inliers of the current model.
///
/// Stops as soon as a round fails to grow the inlier set, or after
/// `max_iterations` rounds.
#[derive(Clone, Copy, Debug)]
pub struct IteratedLeastSquaresOptimizer {
    max_iterations: usize,
}

impl Default for IteratedLeastSquaresOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl IteratedLeastSquaresOptimizer {
    pub fn new() -> Self {
        Self { max_iterations: 10 }
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }
}

impl<E: Estimator> LocalOptimizer<E> for IteratedLeastSquaresOptimizer {
    fn run(
        &mut self,
        estimator: &E,
        scoring: &dyn Scoring,
        points1: &[E::Point1],
        points2: &[E::Point2],
        best: &Hypothesis<E::Model>,
    ) -> Option<Hypothesis<E::Model>> {
        let mut current = best.clone();
        let mut improved = false;

        for _iteration in 0..self.max_iterations {
            if current.inliers.len() < estimator.non_minimal_sample_size() {
                break;
            }

            let Some(candidate) = refit(estimator, scoring, points1, points2, &current.inliers)
            else {
                break;
            };
            if !(candidate.score > current.score) {
                break;
            }

            let grew = candidate.score.inlier_count > current.score.inlier_count;
            current = candidate;
            improved = true;
            if !grew {
                break;
            }
        }

        improved.then_some(current)
    }
}

/// Nested RANSAC optimizer that re-fits on random subsets of the inliers.
///
/// Each round draws `sample_size_multiplier * sample_size` of the current
/// inliers (all of them if there are fewer), fits the non-minimal solver and
/// keeps the result if it scores higher.
#[derive(Clone, Debug)]
pub struct NestedRansacOptimizer {
    max_iterations: usize,
    sample_size_multiplier: usize,
    sampler: UniformRandomSampler,
}

impl Default for NestedRansacOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

impl NestedRansacOptimizer {
    pub fn new() -> Self {
        Self::with_sampler(UniformRandomSampler::new())
    }

    pub fn from_seed(seed: u64) -> Self {
        Self::with_sampler(UniformRandomSampler::from_seed(seed))
    }

    fn with_sampler(sampler: UniformRandomSampler) -> Self {
        Self {
            max_iterations: 10,
            sample_size_multiplier: 2,
            sampler,
        }
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    pub fn set_sample_size_multiplier(&mut self, multiplier: usize) {
        self.sample_size_multiplier = multiplier;
    }
}

impl<E: Estimator> LocalOptimizer<E> for NestedRansacOptimizer {
    fn run(
        &mut self,
        estimator: &E,
        scoring: &dyn Scoring,
        points1: &[E::Point1],
        points2: &[E::Point2],
        best: &Hypothesis<E::Model>,
    ) -> Option<Hypothesis<E::Model>> {
        let min_points = estimator.non_minimal_sample_size();
        let subset_size = (self.sample_size_multiplier * estimator.sample_size()).max(min_points);

        let mut current = best.clone();
        let mut improved = false;
        let mut sample = vec![0usize; subset_size];

        for _iteration in 0..self.max_iterations {
            let num_inliers = current.inliers.len();
            if num_inliers < min_points {
                break;
            }

            let use_all = num_inliers <= subset_size;
            let indices: Vec<usize> = if use_all {
                current.inliers.clone()
            } else {
                if !self.sampler.sample(num_inliers, &mut sample) {
                    break;
                }
                sample.iter().map(|&j| current.inliers[j]).collect()
            };

            match refit(estimator, scoring, points1, points2, &indices) {
                Some(candidate) if candidate.score > current.score => {
                    current = candidate;
                    improved = true;
                }
                // Re-fitting the same full inlier set again cannot help.
                _ if use_all => break,
                _ => {}
            }
        }

        improved.then_some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::{IteratedLeastSquaresOptimizer, NestedRansacOptimizer};
    use crate::core::{Estimator, Hypothesis, LocalOptimizer, Scoring};
    use crate::scoring::InlierCountScoring;

    /// 1D offset model `p2 = p1 + offset`, fitted as the mean difference.
    struct OffsetEstimator;

    impl Estimator for OffsetEstimator {
        type Point1 = f64;
        type Point2 = f64;
        type Model = f64;

        fn sample_size(&self) -> usize {
            1
        }

        fn estimate_model(&self, points1: &[f64], points2: &[f64]) -> Vec<f64> {
            let n = points1.len() as f64;
            vec![points1.iter().zip(points2).map(|(a, b)| b - a).sum::<f64>() / n]
        }

        fn residuals(&self, points1: &[f64], points2: &[f64], model: &f64, residuals: &mut Vec<f64>) {
            residuals.clear();
            residuals.extend(points1.iter().zip(points2).map(|(a, b)| (b - a - model).abs()));
        }
    }

    /// 19 inliers with offsets spread over [1.91, 2.09] and 5 outliers.
    fn spread_data() -> (Vec<f64>, Vec<f64>) {
        let mut p1 = Vec::new();
        let mut p2 = Vec::new();
        for j in 0..19 {
            let x = j as f64;
            p1.push(x);
            p2.push(x + 2.0 + 0.01 * (j as f64 - 9.0));
        }
        for k in 0..5 {
            let x = 100.0 + k as f64;
            p1.push(x);
            p2.push(x + 10.0 * (k + 1) as f64);
        }
        (p1, p2)
    }

    fn initial(scoring: &dyn Scoring, p1: &[f64], p2: &[f64]) -> Hypothesis<f64> {
        let model = 2.09;
        let mut residuals = Vec::new();
        let mut inliers = Vec::new();
        OffsetEstimator.residuals(p1, p2, &model, &mut residuals);
        let score = scoring.score(&residuals, &mut inliers);
        Hypothesis {
            model,
            score,
            inliers,
        }
    }

    #[test]
    fn iterated_lsq_grows_inlier_set() {
        let (p1, p2) = spread_data();
        let scoring = InlierCountScoring::new(0.104);
        let start = initial(&scoring, &p1, &p2);
        assert_eq!(start.score.inlier_count, 11);

        let mut lo = IteratedLeastSquaresOptimizer::new();
        let refined = lo
            .run(&OffsetEstimator, &scoring, &p1, &p2, &start)
            .expect("refinement should improve");
        assert_eq!(refined.score.inlier_count, 19);
        // Fitted on 18 inliers; the re-fit on all 19 ties and is discarded.
        assert!((refined.model - 2.005).abs() < 1e-9);
        assert!(refined.inliers.iter().all(|&i| i < 19));
    }

    #[test]
    fn iterated_lsq_respects_iteration_cap() {
        let (p1, p2) = spread_data();
        let scoring = InlierCountScoring::new(0.104);
        let start = initial(&scoring, &p1, &p2);

        let mut lo = IteratedLeastSquaresOptimizer::new();
        lo.set_max_iterations(1);
        let refined = lo
            .run(&OffsetEstimator, &scoring, &p1, &p2, &start)
            .expect("one round still improves");
        assert_eq!(refined.score.inlier_count, 16);
    }

    #[test]
    fn no_improvement_returns_none() {
        let (p1, p2) = spread_data();
        let scoring = InlierCountScoring::new(0.104);
        let mut converged = initial(&scoring, &p1, &p2);
        converged.model = 2.0;
        let mut residuals = Vec::new();
        OffsetEstimator.residuals(&p1, &p2, &converged.model, &mut residuals);
        converged.score = scoring.score(&residuals, &mut converged.inliers);
        assert_eq!(converged.score.inlier_count, 19);

        let mut lo = IteratedLeastSquaresOptimizer::new();
        assert!(lo.run(&OffsetEstimator, &scoring, &p1, &p2, &converged).is_none());
        let mut nested = NestedRansacOptimizer::from_seed(1);
        assert!(nested.run(&OffsetEstimator, &scoring, &p1, &p2, &converged).is_none());
    }

    #[test]
    fn nested_ransac_with_full_subsets_matches_iterated_lsq() {
        let (p1, p2) = spread_data();
        let scoring = InlierCountScoring::new(0.104);
        let start = initial(&scoring, &p1, &p2);

        let mut lo = NestedRansacOptimizer::from_seed(0);
        lo.set_sample_size_multiplier(100);
        let refined = lo
            .run(&OffsetEstimator, &scoring, &p1, &p2, &start)
            .expect("refinement should improve");
        assert_eq!(refined.score.inlier_count, 19);
    }

    #[test]
    fn nested_ransac_with_small_subsets_is_bounded_and_monotone() {
        let (p1, p2) = spread_data();
        let scoring = InlierCountScoring::new(0.104);
        let start = initial(&scoring, &p1, &p2);

        let mut lo = NestedRansacOptimizer::from_seed(42);
        lo.set_max_iterations(25);
        if let Some(refined) = lo.run(&OffsetEstimator, &scoring, &p1, &p2, &start) {
            assert!(refined.score > start.score);
            assert!(refined.score.inlier_count <= 19);
        }
    }
}

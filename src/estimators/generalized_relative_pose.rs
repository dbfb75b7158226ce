//! Relative pose between two instants of a multi-camera rig.
//!
//! Every correspondence carries the `cam_from_rig` pose of the sub-camera that
//! observed it, so its viewing ray is known in the rig frame as a Plücker line
//! `(q, q')`. Two rays through the same 3D point intersect, which for the
//! relative motion `rig2_from_rig1 = (R, t)` gives the generalized epipolar
//! constraint
//!
//! ```text
//! q2ᵀ E q1 + q2ᵀ R q1' + q2'ᵀ R q1 = 0,    E = [t]x R
//! ```
//!
//! Minimal samples hold eight correspondences. Each is solved by
//! Levenberg-Marquardt over `(R, t)` on the signed Sampson distances of the
//! pairs, started from the rotation aligning the two bundles of bearings and
//! from the identity; the translation of each start is the least-squares
//! solution of the constraint above, which is linear in `t` once `R` is fixed.
//! The Sampson distance is undefined where the motion between two sub-cameras
//! vanishes, so the trivial motion that satisfies the constraint for pairs
//! seen by the same sub-camera in both views is never a solution.
//!
//! Larger sets are first solved linearly: the constraint is linear in the 18
//! entries of `E` and `R`, and the scale follows from `R` having unit
//! singular values. That system has a second null vector `(0, I)` when every
//! pair is seen by the same sub-camera twice; the fit then falls back to the
//! iterative solver.
//!
//! A sample seen by a single sub-camera is central and does not fix the
//! scale of `t`; its models are wrong and lose on support.

use crate::core::Estimator;
use crate::models::RigidTransform;
use crate::types::Correspondence;
use crate::utils::{cross_product_matrix, skew_vector};
use nalgebra::{DMatrix, DVector, Matrix3, MatrixXx6, UnitQuaternion, Vector3, Vector6, SVD};

const SAMPLE_SIZE: usize = 8;
const LINEAR_SAMPLE_SIZE: usize = 17;
const NUM_UNKNOWNS: usize = 18;

/// Relative singular value below which a second null direction is assumed.
const RANK_TOLERANCE: f64 = 1e-10;

const MAX_ITERATIONS: usize = 30;
const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MUL: f64 = 10.0;
const MAX_LAMBDA: f64 = 1e10;
/// Central difference steps, in radians and in translation units.
const ROTATION_STEP: f64 = 1e-7;
const TRANSLATION_STEP: f64 = 1e-7;
/// Mean squared Sampson distance at which a fit is exact.
const CONVERGED_COST: f64 = 1e-20;
/// A run stops after this many accepted steps in a row that each lower the
/// cost by less than `MIN_RELATIVE_DECREASE`.
const MIN_RELATIVE_DECREASE: f64 = 1e-6;
const MAX_STALLED_STEPS: usize = 3;

/// Generalized relative pose estimator for multi-camera rigs.
///
/// Models are `rig2_from_rig1`; residuals are squared Sampson errors between
/// the two sub-cameras involved in each pair.
#[derive(Clone, Copy, Debug, Default)]
pub struct GeneralizedRelativePoseEstimator;

impl GeneralizedRelativePoseEstimator {
    pub fn new() -> Self {
        Self
    }
}

/// Stack one generalized epipolar constraint per pair into an `N x 18`
/// system, padded with zero rows to stay at least square.
fn build_system(points1: &[Correspondence], points2: &[Correspondence]) -> DMatrix<f64> {
    let rows = points1.len().max(NUM_UNKNOWNS);
    let mut a = DMatrix::<f64>::zeros(rows, NUM_UNKNOWNS);

    for (row, (p1, p2)) in points1.iter().zip(points2).enumerate() {
        let l1 = p1.ray();
        let l2 = p2.ray();
        let (q1, m1) = (l1.direction, l1.moment);
        let (q2, m2) = (l2.direction, l2.moment);

        for r in 0..3 {
            for c in 0..3 {
                a[(row, 3 * r + c)] = q2[r] * q1[c];
                a[(row, 9 + 3 * r + c)] = q2[r] * m1[c] + m2[r] * q1[c];
            }
        }
    }

    a
}

/// Solve the stacked linear system for `(R, t)`.
fn solve_linear(a: DMatrix<f64>) -> Option<RigidTransform> {
    if a.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let svd = SVD::new(a, false, true);
    let v_t = svd.v_t?;

    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&i, &j| svd.singular_values[j].total_cmp(&svd.singular_values[i]));
    let largest = svd.singular_values[order[0]];
    let null_idx = order[NUM_UNKNOWNS - 1];
    let next_idx = order[NUM_UNKNOWNS - 2];
    if largest <= 0.0 || svd.singular_values[next_idx] < RANK_TOLERANCE * largest {
        return None;
    }

    let x: Vec<f64> = v_t.row(null_idx).iter().copied().collect();
    let mut e = Matrix3::from_row_slice(&x[..9]);
    let mut r_scaled = Matrix3::from_row_slice(&x[9..]);

    // The null vector is only defined up to sign.
    if r_scaled.determinant() < 0.0 {
        e = -e;
        r_scaled = -r_scaled;
    }

    let r_svd = r_scaled.svd(true, true);
    let (u, v_t) = (r_svd.u?, r_svd.v_t?);
    let scale = r_svd.singular_values.mean();
    if !scale.is_finite() || scale <= f64::EPSILON {
        return None;
    }

    let mut rotation = u * v_t;
    if rotation.determinant() < 0.0 {
        let weakest = r_svd.singular_values.imin();
        let mut u_fixed = u;
        u_fixed.column_mut(weakest).neg_mut();
        rotation = u_fixed * v_t;
    }

    let e = e / scale;
    let translation = skew_vector(&(e * rotation.transpose()));
    if !translation.iter().all(|v| v.is_finite()) {
        return None;
    }

    Some(RigidTransform::from_rt(rotation, translation))
}

/// Rotation best aligning the rig-frame bearings of the second instant with
/// those of the first, ignoring translation.
fn align_bearings(
    points1: &[Correspondence],
    points2: &[Correspondence],
) -> Option<UnitQuaternion<f64>> {
    let mut h = Matrix3::zeros();
    for (p1, p2) in points1.iter().zip(points2) {
        h += p2.ray().direction * p1.ray().direction.transpose();
    }

    let svd = h.svd(true, true);
    let (u, v_t) = (svd.u?, svd.v_t?);
    let mut rotation = u * v_t;
    if rotation.determinant() < 0.0 {
        let weakest = svd.singular_values.imin();
        let mut u_fixed = u;
        u_fixed.column_mut(weakest).neg_mut();
        rotation = u_fixed * v_t;
    }

    rotation
        .iter()
        .all(|v| v.is_finite())
        .then(|| RigidTransform::from_rt(rotation, Vector3::zeros()).rotation)
}

/// Least-squares translation for a fixed rotation.
///
/// With `R` known, each constraint reads `t · (R q1 x q2) = -(q2 · R q1' + q2' · R q1)`.
/// Returns `None` when the solution is (numerically) zero.
fn translation_for(
    points1: &[Correspondence],
    points2: &[Correspondence],
    rotation: &UnitQuaternion<f64>,
) -> Option<Vector3<f64>> {
    let mut ata = Matrix3::zeros();
    let mut atb = Vector3::zeros();
    for (p1, p2) in points1.iter().zip(points2) {
        let l1 = p1.ray();
        let l2 = p2.ray();
        let q1 = rotation * l1.direction;
        let m1 = rotation * l1.moment;
        let a = q1.cross(&l2.direction);
        let b = q1.dot(&l2.moment) + l2.direction.dot(&m1);
        ata += a * a.transpose();
        atb -= a * b;
    }

    let t = ata.svd(true, true).solve(&atb, 1e-12).ok()?;
    (t.iter().all(|v| v.is_finite()) && t.norm() > 1e-12).then_some(t)
}

/// Essential matrix between the two sub-cameras of a pair under `model`.
fn pair_essential(
    model: &RigidTransform,
    p1: &Correspondence,
    p2: &Correspondence,
) -> Matrix3<f64> {
    let cam2_from_cam1 = p2.rel_tform * *model * p1.rel_tform.inverse();
    cross_product_matrix(&cam2_from_cam1.translation)
        * cam2_from_cam1.rotation.to_rotation_matrix().into_inner()
}

/// Signed Sampson distance of `x2ᵀ E x1 = 0`.
///
/// `None` when `E` annihilates both points, e.g. for a pair whose two
/// sub-cameras coincide after the motion.
fn sampson_distance(e: &Matrix3<f64>, x1: &Vector3<f64>, x2: &Vector3<f64>) -> Option<f64> {
    let ex1 = e * x1;
    let etx2 = e.tr_mul(x2);
    let num = x2.dot(&ex1);
    let denom = ex1.x * ex1.x + ex1.y * ex1.y + etx2.x * etx2.x + etx2.y * etx2.y;
    if denom <= f64::MIN_POSITIVE {
        return None;
    }

    let r = num / denom.sqrt();
    r.is_finite().then_some(r)
}

/// Rotation vector followed by translation.
fn to_params(model: &RigidTransform) -> Vector6<f64> {
    let w = model.rotation.scaled_axis();
    let t = model.translation;
    Vector6::new(w.x, w.y, w.z, t.x, t.y, t.z)
}

fn from_params(x: &Vector6<f64>) -> RigidTransform {
    RigidTransform::new(
        UnitQuaternion::from_scaled_axis(Vector3::new(x[0], x[1], x[2])),
        Vector3::new(x[3], x[4], x[5]),
    )
}

/// Write the signed Sampson distances under `x` into `out` and return their
/// squared sum. `None` if any of them is undefined.
fn evaluate(
    points1: &[Correspondence],
    points2: &[Correspondence],
    x: &Vector6<f64>,
    out: &mut DVector<f64>,
) -> Option<f64> {
    let model = from_params(x);
    for (i, (p1, p2)) in points1.iter().zip(points2).enumerate() {
        let e = pair_essential(&model, p1, p2);
        out[i] = sampson_distance(&e, &p1.xy.push(1.0), &p2.xy.push(1.0))?;
    }
    Some(out.norm_squared())
}

/// Central-difference Jacobian of [`evaluate`] at `x`.
fn numeric_jacobian(
    points1: &[Correspondence],
    points2: &[Correspondence],
    x: &Vector6<f64>,
    jacobian: &mut MatrixXx6<f64>,
    plus: &mut DVector<f64>,
    minus: &mut DVector<f64>,
) -> Option<()> {
    let t_scale = x.fixed_rows::<3>(3).amax().max(1.0);
    for k in 0..6 {
        let h = if k < 3 {
            ROTATION_STEP
        } else {
            TRANSLATION_STEP * t_scale
        };
        let mut x_plus = *x;
        let mut x_minus = *x;
        x_plus[k] += h;
        x_minus[k] -= h;
        evaluate(points1, points2, &x_plus, plus)?;
        evaluate(points1, points2, &x_minus, minus)?;
        jacobian.set_column(k, &((&*plus - &*minus) / (2.0 * h)));
    }
    Some(())
}

/// Levenberg-Marquardt on the Sampson distances of all pairs.
///
/// Returns the refined model and its mean squared Sampson distance, or `None`
/// if the distances are undefined at `initial`.
fn refine(
    points1: &[Correspondence],
    points2: &[Correspondence],
    initial: &RigidTransform,
) -> Option<(RigidTransform, f64)> {
    let n = points1.len();
    let mut x = to_params(initial);
    let mut residuals = DVector::zeros(n);
    let mut trial = DVector::zeros(n);
    let mut plus = DVector::zeros(n);
    let mut minus = DVector::zeros(n);
    let mut jacobian = MatrixXx6::zeros(n);

    let mut cost = evaluate(points1, points2, &x, &mut residuals)?;
    let mut lambda = LAMBDA_INIT;
    let mut stalled = 0;

    for _iteration in 0..MAX_ITERATIONS {
        if cost <= CONVERGED_COST * n as f64 {
            break;
        }
        if numeric_jacobian(points1, points2, &x, &mut jacobian, &mut plus, &mut minus).is_none() {
            break;
        }

        let normal = jacobian.tr_mul(&jacobian);
        let gradient = jacobian.tr_mul(&residuals);

        let mut decrease = None;
        while lambda <= MAX_LAMBDA {
            let mut damped = normal;
            for d in 0..6 {
                damped[(d, d)] += lambda;
            }
            let Some(delta) = damped.cholesky().map(|c| c.solve(&gradient)) else {
                lambda *= LAMBDA_MUL;
                continue;
            };

            let x_new = x - delta;
            match evaluate(points1, points2, &x_new, &mut trial) {
                Some(new_cost) if new_cost < cost => {
                    decrease = Some(cost - new_cost);
                    x = x_new;
                    cost = new_cost;
                    std::mem::swap(&mut residuals, &mut trial);
                    lambda = (lambda / LAMBDA_MUL).max(1e-12);
                    break;
                }
                _ => lambda *= LAMBDA_MUL,
            }
        }

        match decrease {
            Some(d) if d > MIN_RELATIVE_DECREASE * (cost + d) => stalled = 0,
            Some(_) if stalled + 1 < MAX_STALLED_STEPS => stalled += 1,
            _ => break,
        }
    }

    x.iter()
        .all(|v| v.is_finite())
        .then(|| (from_params(&x), cost / n as f64))
}

fn same_motion(a: &RigidTransform, b: &RigidTransform) -> bool {
    (a.matrix() - b.matrix()).norm() < 1e-9
}

impl GeneralizedRelativePoseEstimator {
    /// Run the iterative solver from each starting rotation until one fits
    /// the points exactly.
    fn solve_iterative(
        &self,
        points1: &[Correspondence],
        points2: &[Correspondence],
    ) -> Vec<RigidTransform> {
        let starts = align_bearings(points1, points2)
            .into_iter()
            .chain(std::iter::once(UnitQuaternion::identity()));

        let mut models: Vec<RigidTransform> = Vec::new();
        for rotation in starts {
            let Some(translation) = translation_for(points1, points2, &rotation) else {
                continue;
            };
            let Some((model, cost)) =
                refine(points1, points2, &RigidTransform::new(rotation, translation))
            else {
                continue;
            };

            if !models.iter().any(|m| same_motion(m, &model)) {
                models.push(model);
            }
            if cost <= CONVERGED_COST {
                break;
            }
        }

        models
    }
}

impl Estimator for GeneralizedRelativePoseEstimator {
    type Point1 = Correspondence;
    type Point2 = Correspondence;
    type Model = RigidTransform;

    fn sample_size(&self) -> usize {
        SAMPLE_SIZE
    }

    fn estimate_model(
        &self,
        points1: &[Correspondence],
        points2: &[Correspondence],
    ) -> Vec<RigidTransform> {
        if points1.len() != points2.len() || points1.len() < SAMPLE_SIZE {
            return Vec::new();
        }

        self.solve_iterative(points1, points2)
    }

    fn estimate_model_nonminimal(
        &self,
        points1: &[Correspondence],
        points2: &[Correspondence],
    ) -> Vec<RigidTransform> {
        if points1.len() != points2.len() || points1.len() < SAMPLE_SIZE {
            return Vec::new();
        }

        let linear = (points1.len() >= LINEAR_SAMPLE_SIZE)
            .then(|| solve_linear(build_system(points1, points2)))
            .flatten();
        match linear {
            Some(linear) => match refine(points1, points2, &linear) {
                Some((refined, _)) => vec![refined],
                None => vec![linear],
            },
            None => self.solve_iterative(points1, points2),
        }
    }

    fn residuals(
        &self,
        points1: &[Correspondence],
        points2: &[Correspondence],
        model: &RigidTransform,
        residuals: &mut Vec<f64>,
    ) {
        residuals.clear();
        residuals.reserve(points1.len());

        for (p1, p2) in points1.iter().zip(points2) {
            let e = pair_essential(model, p1, p2);
            let r = sampson_distance(&e, &p1.xy.push(1.0), &p2.xy.push(1.0))
                .map(|d| d * d)
                .filter(|r| r.is_finite());
            residuals.push(r.unwrap_or(f64::MAX));
        }
    }
}

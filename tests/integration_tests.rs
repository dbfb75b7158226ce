//! Integration tests for the high-level Rust API.
//!
//! These tests run the full LO-RANSAC pipeline on synthetic multi-camera rig
//! data and check the recovered motion, the inlier sets and the failure modes.

use nalgebra::{Quaternion, UnitQuaternion, Vector2, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rigsac::estimators::GeneralizedRelativePoseEstimator;
use rigsac::settings::{LocalOptimizationType, SamplerType, ScoringType};
use rigsac::*;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn frobenius(a: &RigidTransform, b: &RigidTransform) -> f64 {
    (a.matrix() - b.matrix()).norm()
}

/// `cam_from_rig` poses of a three-camera rig.
fn rig() -> [RigidTransform; 3] {
    [
        RigidTransform::identity(),
        RigidTransform::new(
            UnitQuaternion::from_euler_angles(0.0, 0.25, 0.0),
            Vector3::new(-0.6, 0.0, 0.05),
        ),
        RigidTransform::new(
            UnitQuaternion::from_euler_angles(-0.1, -0.2, 0.1),
            Vector3::new(0.2, -0.5, 0.0),
        ),
    ]
}

fn ground_truth() -> RigidTransform {
    RigidTransform::new(
        UnitQuaternion::from_euler_angles(0.04, 0.12, -0.06),
        Vector3::new(-0.4, 0.1, 0.25),
    )
}

/// Noiseless correspondences of points in front of the rig. Point `j` is seen
/// by camera `j % 3` first and by camera `(j + 1) % 3` after the motion.
fn scene(
    rig2_from_rig1: &RigidTransform,
    n: usize,
    seed: u64,
) -> (Vec<Correspondence>, Vec<Correspondence>) {
    scene_with_shift(rig2_from_rig1, n, seed, 1)
}

/// Like [`scene`], with point `j` seen by camera `(j + shift) % 3` after the
/// motion. A zero shift keeps every point in the same camera.
fn scene_with_shift(
    rig2_from_rig1: &RigidTransform,
    n: usize,
    seed: u64,
    shift: usize,
) -> (Vec<Correspondence>, Vec<Correspondence>) {
    let cams = rig();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut points1 = Vec::with_capacity(n);
    let mut points2 = Vec::with_capacity(n);

    while points1.len() < n {
        let x = Vector3::new(
            rng.gen_range(-3.0..3.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(4.0..10.0),
        );
        let j = points1.len();
        let (cam1, cam2) = (cams[j % 3], cams[(j + shift) % 3]);
        let x1 = cam1 * x;
        let x2 = cam2 * (*rig2_from_rig1 * x);
        if x1.z <= 0.1 || x2.z <= 0.1 {
            continue;
        }
        points1.push(Correspondence::new(cam1, x1.xy() / x1.z));
        points2.push(Correspondence::new(cam2, x2.xy() / x2.z));
    }

    (points1, points2)
}

fn seeded(seed: u64) -> RansacSettings {
    RansacSettings {
        seed: Some(seed),
        ..Default::default()
    }
}

#[test]
fn test_generalized_relative_pose_rig_sweep() {
    init_logger();

    const NUM_POINTS: usize = 100;
    const REF_TFORM: usize = 1;

    let mut rng = StdRng::seed_from_u64(2023);
    let points3d: Vec<Vector3<f64>> = (0..NUM_POINTS)
        .map(|_| {
            Vector3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            )
        })
        .collect();

    for qi in 0..4 {
        for ti in 0..5 {
            let qx = 0.1 * qi as f64;
            let tx = 0.1 * ti as f64;

            let cam_from_world = |dq: f64, ty: f64| {
                RigidTransform::new(
                    UnitQuaternion::from_quaternion(Quaternion::new(1.0, qx + dq, 0.0, 0.0)),
                    Vector3::new(tx, ty, 0.0),
                )
            };
            let cams_from_world = [
                cam_from_world(0.0, 0.1),
                cam_from_world(0.05, 0.2),
                cam_from_world(0.1, 0.3),
            ];
            let ref_inv = cams_from_world[REF_TFORM].inverse();
            let rel_tforms: Vec<RigidTransform> =
                cams_from_world.iter().map(|c| *c * ref_inv).collect();

            let mut points1 = Vec::new();
            let mut points2 = Vec::new();
            for (i, x) in points3d.iter().enumerate() {
                let x1 = rel_tforms[i % 3] * *x;
                let x2 = cams_from_world[(i + 1) % 3] * *x;
                if x1.z < 0.0 || x2.z < 0.0 {
                    continue;
                }
                points1.push(Correspondence::new(rel_tforms[i % 3], x1.xy() / x1.z));
                points2.push(Correspondence::new(rel_tforms[(i + 1) % 3], x2.xy() / x2.z));
            }
            assert!(points1.len() >= 8);

            let settings = RansacSettings {
                max_error: 1e-3,
                ..seeded(qi as u64 * 10 + ti as u64)
            };
            let report = estimate_generalized_relative_pose(&points1, &points2, &settings)
                .expect("valid input");

            assert!(report.success, "qx = {qx}, tx = {tx}");
            assert!(
                frobenius(&cams_from_world[REF_TFORM], &report.model) < 1e-2,
                "qx = {qx}, tx = {tx}"
            );

            let mut residuals = Vec::new();
            GeneralizedRelativePoseEstimator::new().residuals(
                &points1,
                &points2,
                &report.model,
                &mut residuals,
            );
            for (r, &inlier) in residuals.iter().zip(&report.inlier_mask) {
                if inlier {
                    assert!(*r <= settings.max_error);
                }
            }
            assert!(residuals.iter().all(|&r| r <= settings.max_error));
        }
    }
}

#[test]
fn test_generalized_relative_pose_with_outliers() {
    init_logger();

    let gt = ground_truth();
    let (p1, mut p2) = scene(&gt, 100, 11);
    let mut rng = StdRng::seed_from_u64(12);
    let outliers: Vec<usize> = (0..100).filter(|i| i % 5 == 2).collect();
    for &i in &outliers {
        p2[i].xy = Vector2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
    }

    let settings = RansacSettings {
        max_error: 1e-6,
        min_inlier_ratio: 0.5,
        ..seeded(3)
    };
    let report = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();

    assert!(report.success);
    assert!(frobenius(&gt, &report.model) < 1e-2);
    for i in (0..100).filter(|i| !outliers.contains(i)) {
        assert!(report.inlier_mask[i], "inlier {i} rejected");
    }
    assert!(report.num_inliers >= 80);
    assert_eq!(
        report.num_inliers,
        report.inlier_mask.iter().filter(|&&m| m).count()
    );
    assert!(report.num_trials <= settings.max_num_trials);
}

#[test]
fn test_generalized_relative_pose_at_outlier_bound() {
    init_logger();

    // Half of the correspondences are wrong, matching min_inlier_ratio = 0.5.
    let gt = ground_truth();
    let (p1, mut p2) = scene(&gt, 100, 13);
    let mut rng = StdRng::seed_from_u64(14);
    for p in p2.iter_mut().skip(1).step_by(2) {
        p.xy = Vector2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5));
    }

    let settings = RansacSettings {
        max_error: 1e-6,
        min_inlier_ratio: 0.5,
        ..seeded(0)
    };
    let report = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();

    assert!(report.success, "trials = {}", report.num_trials);
    assert!(frobenius(&gt, &report.model) < 1e-4);
    for i in (0..100).step_by(2) {
        assert!(report.inlier_mask[i], "inlier {i} rejected");
    }
    // A random outlier may still land within 1e-3 of its epipolar curve.
    assert!(report.num_inliers >= 50 && report.num_inliers <= 53);
}

#[test]
fn test_generalized_relative_pose_same_camera_in_both_views() {
    init_logger();

    let gt = ground_truth();
    let (p1, p2) = scene_with_shift(&gt, 100, 15, 0);
    assert!(p1.iter().zip(&p2).all(|(a, b)| a.rel_tform == b.rel_tform));

    let report = estimate_generalized_relative_pose(&p1, &p2, &seeded(1)).unwrap();
    assert!(report.success);
    assert_eq!(report.num_inliers, 100);

    let settings = RansacSettings {
        max_error: 1e-8,
        ..seeded(1)
    };
    let report = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();
    assert!(report.success);
    assert!(frobenius(&gt, &report.model) < 1e-4);
    assert_eq!(report.num_inliers, 100);
}

#[test]
fn test_generalized_relative_pose_with_noise() {
    init_logger();

    let gt = ground_truth();
    let (mut p1, mut p2) = scene(&gt, 100, 16);
    let mut rng = StdRng::seed_from_u64(17);
    for p in p1.iter_mut().chain(p2.iter_mut()) {
        p.xy += Vector2::new(rng.gen_range(-1e-3..1e-3), rng.gen_range(-1e-3..1e-3));
    }

    let settings = RansacSettings {
        max_error: 1e-5,
        ..seeded(2)
    };
    let report = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();

    assert!(report.success);
    assert!(report.num_inliers >= 90);
    assert!(frobenius(&gt, &report.model) < 2e-2);
}

#[test]
fn test_generalized_relative_pose_insufficient_points() {
    init_logger();

    let (p1, p2) = scene(&ground_truth(), 7, 21);
    let report = estimate_generalized_relative_pose(&p1, &p2, &seeded(0)).unwrap();

    assert!(!report.success);
    assert_eq!(report.num_trials, 0);
    assert_eq!(report.num_inliers, 0);
    assert_eq!(report.model, RigidTransform::identity());
    assert_eq!(report.inlier_mask, vec![false; 7]);
}

#[test]
fn test_generalized_relative_pose_mismatched_lengths() {
    let (p1, p2) = scene(&ground_truth(), 20, 22);
    let err = estimate_generalized_relative_pose(&p1, &p2[..19], &seeded(0)).unwrap_err();
    assert_eq!(
        err,
        RansacError::MismatchedCorrespondences {
            points1: 20,
            points2: 19
        }
    );
}

#[test]
fn test_generalized_relative_pose_without_consensus() {
    init_logger();

    // Unrelated observations: no motion explains more than a handful of pairs.
    let cams = rig();
    let mut rng = StdRng::seed_from_u64(31);
    let mut random_obs = |j: usize| {
        Correspondence::new(
            cams[j % 3],
            Vector2::new(rng.gen_range(-0.5..0.5), rng.gen_range(-0.5..0.5)),
        )
    };
    let p1: Vec<Correspondence> = (0..60).map(&mut random_obs).collect();
    let p2: Vec<Correspondence> = (0..60).map(|j| random_obs(j + 1)).collect();

    let settings = RansacSettings {
        max_error: 1e-8,
        min_inlier_ratio: 0.5,
        max_num_trials: 200,
        ..seeded(4)
    };
    let report = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();

    assert!(!report.success);
    assert_eq!(report.num_inliers, 0);
    assert_eq!(report.model, RigidTransform::identity());
    assert!(report.inlier_mask.iter().all(|&m| !m));
    assert!(report.num_trials <= 200);
}

#[test]
fn test_generalized_relative_pose_is_deterministic_under_seed() {
    init_logger();

    let gt = ground_truth();
    let (p1, mut p2) = scene(&gt, 60, 41);
    for i in (0..60).step_by(6) {
        p2[i].xy += Vector2::new(0.2, -0.1);
    }

    for local_optimization in [
        LocalOptimizationType::IteratedLsq,
        LocalOptimizationType::NestedRansac,
    ] {
        let settings = RansacSettings {
            max_error: 1e-6,
            local_optimization,
            ..seeded(99)
        };
        let a = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();
        let b = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();
        assert!(a.success);
        assert_eq!(a, b);
    }
}

#[test]
fn test_generalized_relative_pose_component_variants() {
    init_logger();

    let gt = ground_truth();
    let (p1, mut p2) = scene(&gt, 80, 51);
    for i in (0..80).step_by(8) {
        p2[i].xy = -p2[i].xy;
    }

    let variants = [
        (ScoringType::Msac, SamplerType::Uniform, LocalOptimizationType::IteratedLsq),
        (ScoringType::Ransac, SamplerType::Prosac, LocalOptimizationType::NestedRansac),
        (ScoringType::Msac, SamplerType::Uniform, LocalOptimizationType::None),
    ];

    for (scoring, sampler, local_optimization) in variants {
        let settings = RansacSettings {
            max_error: 1e-6,
            scoring,
            sampler,
            local_optimization,
            ..seeded(7)
        };
        let report = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();
        assert!(report.success, "{scoring:?} {sampler:?} {local_optimization:?}");
        assert!(frobenius(&gt, &report.model) < 1e-3);
        assert!(report.num_inliers >= 70);
    }
}

#[test]
fn test_exhaustive_sampler_stops_after_first_clean_sample() {
    init_logger();

    let gt = ground_truth();
    let (p1, p2) = scene(&gt, 20, 61);
    let settings = RansacSettings {
        sampler: SamplerType::Exhaustive,
        max_error: 1e-8,
        ..Default::default()
    };
    let report = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();

    assert!(report.success);
    assert_eq!(report.num_trials, 1);
    assert_eq!(report.num_inliers, 20);
}

#[test]
fn test_min_num_trials_forces_extra_samples() {
    init_logger();

    let (p1, p2) = scene(&ground_truth(), 40, 71);
    let settings = RansacSettings {
        max_error: 1e-8,
        min_num_trials: 25,
        ..seeded(8)
    };
    let report = estimate_generalized_relative_pose(&p1, &p2, &settings).unwrap();
    assert!(report.success);
    assert_eq!(report.num_trials, 25);
}

#[test]
fn test_independent_estimations_run_on_separate_threads() {
    init_logger();

    fn assert_send<T: Send>() {}
    assert_send::<ConfiguredRansac<GeneralizedRelativePoseEstimator>>();
    assert_send::<Report<RigidTransform>>();

    let gt = ground_truth();
    let handles: Vec<_> = (0..4u64)
        .map(|k| {
            std::thread::spawn(move || {
                let (p1, p2) = scene(&gt, 50, 100 + k);
                let mut ransac =
                    build_ransac(GeneralizedRelativePoseEstimator::new(), &seeded(k)).unwrap();
                ransac.estimate(&p1, &p2).unwrap()
            })
        })
        .collect();

    for handle in handles {
        let report = handle.join().expect("estimation thread panicked");
        assert!(report.success);
        assert!(frobenius(&gt, &report.model) < 1e-4);
    }
}

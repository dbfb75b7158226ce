//! Example: Relative pose of a three-camera rig
//!
//! Builds synthetic correspondences seen by different sub-cameras at two
//! instants, corrupts a fraction of them, and recovers the rig motion.
//!
//! Run with `RUST_LOG=debug` to follow the trial budget.

use nalgebra::{UnitQuaternion, Vector2, Vector3};
use rand::Rng;
use rigsac::settings::ScoringType;
use rigsac::{estimate_generalized_relative_pose, Correspondence, RansacSettings, RigidTransform};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    println!("=== Multi-Camera Rig Relative Pose Example ===\n");

    let cams = [
        RigidTransform::identity(),
        RigidTransform::new(
            UnitQuaternion::from_euler_angles(0.0, 0.4, 0.0),
            Vector3::new(-0.4, 0.0, 0.0),
        ),
        RigidTransform::new(
            UnitQuaternion::from_euler_angles(0.0, -0.4, 0.0),
            Vector3::new(0.4, 0.1, 0.0),
        ),
    ];
    let truth = RigidTransform::new(
        UnitQuaternion::from_euler_angles(0.03, 0.15, -0.02),
        Vector3::new(0.5, 0.0, 1.0),
    );

    let n_points = 200;
    let outlier_ratio = 0.3;
    let mut rng = rand::thread_rng();
    let mut points1 = Vec::with_capacity(n_points);
    let mut points2 = Vec::with_capacity(n_points);
    let mut n_outliers = 0;

    while points1.len() < n_points {
        let x = Vector3::new(
            rng.gen_range(-4.0..4.0),
            rng.gen_range(-2.0..2.0),
            rng.gen_range(4.0..12.0),
        );
        let j = points1.len();
        let (cam1, cam2) = (cams[j % 3], cams[(j + 1) % 3]);
        let x1 = cam1 * x;
        let x2 = cam2 * (truth * x);
        if x1.z <= 0.0 || x2.z <= 0.0 {
            continue;
        }

        let mut xy2 = x2.xy() / x2.z;
        if rng.gen_bool(outlier_ratio) {
            xy2 = Vector2::new(rng.gen_range(-0.8..0.8), rng.gen_range(-0.8..0.8));
            n_outliers += 1;
        }
        points1.push(Correspondence::new(cam1, x1.xy() / x1.z));
        points2.push(Correspondence::new(cam2, xy2));
    }
    println!("{} correspondences, {} outliers\n", n_points, n_outliers);

    let settings = RansacSettings {
        max_error: 1e-6,
        scoring: ScoringType::Msac,
        ..Default::default()
    };
    let report = estimate_generalized_relative_pose(&points1, &points2, &settings)?;

    if !report.success {
        println!("Estimation failed after {} trials", report.num_trials);
        return Ok(());
    }

    println!("Trials:   {}", report.num_trials);
    println!("Inliers:  {} / {}", report.num_inliers, n_points);
    println!("Estimated rig2_from_rig1:{}", report.model.matrix());
    println!("Ground truth:{}", truth.matrix());
    println!(
        "Frobenius error: {:.2e}",
        (report.model.matrix() - truth.matrix()).norm()
    );

    Ok(())
}

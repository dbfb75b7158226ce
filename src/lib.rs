//! # rigsac - Relative pose of multi-camera rigs with LO-RANSAC
//!
//! `rigsac` robustly estimates the rigid motion between two instants of a
//! multi-camera rig (a *generalized camera*) from 2D-2D correspondences that
//! may have been observed by different sub-cameras.
//!
//! ## Quick Start
//!
//! ```rust
//! use rigsac::{estimate_generalized_relative_pose, Correspondence, RansacSettings, RigidTransform};
//! use nalgebra::{UnitQuaternion, Vector2, Vector3};
//!
//! // Two sub-cameras, given as `cam_from_rig`.
//! let cam0 = RigidTransform::identity();
//! let cam1 = RigidTransform::new(UnitQuaternion::identity(), Vector3::new(-0.5, 0.0, 0.0));
//!
//! let obs1 = vec![Correspondence::new(cam0, Vector2::new(0.1, 0.2))];
//! let obs2 = vec![Correspondence::new(cam1, Vector2::new(0.15, 0.2))];
//!
//! // Far too few correspondences: the estimation reports failure, not an error.
//! let report = estimate_generalized_relative_pose(&obs1, &obs2, &RansacSettings::default()).unwrap();
//! assert!(!report.success);
//! assert_eq!(report.model, RigidTransform::identity());
//! ```
//!
//! ## Extending the Library
//!
//! The pipeline is built around a few traits:
//!
//! - **[`Estimator`](crate::core::Estimator)**: minimal and non-minimal solvers plus residuals
//! - **[`Sampler`](crate::core::Sampler)**: minimal sample selection
//! - **[`Scoring`](crate::core::Scoring)**: turning residuals into support
//! - **[`LocalOptimizer`](crate::core::LocalOptimizer)**: refinement of the best model
//! - **[`TerminationCriterion`](crate::core::TerminationCriterion)**: adaptive trial budget
//!
//! [`LoRansac`](crate::core::LoRansac) is generic over all of them, so a new geometric
//! problem only needs an [`Estimator`](crate::core::Estimator).
//!
//! ### Example: Custom Estimator
//!
//! ```rust
//! use rigsac::core::{Estimator, LoRansac, RansacTerminationCriterion};
//! use rigsac::optimisers::NoopLocalOptimizer;
//! use rigsac::samplers::UniformRandomSampler;
//! use rigsac::scoring::InlierCountScoring;
//! use rigsac::RansacSettings;
//!
//! /// Scalar offset between two sequences.
//! struct Offset;
//!
//! impl Estimator for Offset {
//!     type Point1 = f64;
//!     type Point2 = f64;
//!     type Model = f64;
//!
//!     fn sample_size(&self) -> usize {
//!         1
//!     }
//!
//!     fn estimate_model(&self, p1: &[f64], p2: &[f64]) -> Vec<f64> {
//!         vec![p2[0] - p1[0]]
//!     }
//!
//!     fn residuals(&self, p1: &[f64], p2: &[f64], model: &f64, out: &mut Vec<f64>) {
//!         out.clear();
//!         out.extend(p1.iter().zip(p2).map(|(a, b)| (b - a - model).abs()));
//!     }
//! }
//!
//! let settings = RansacSettings { max_error: 1e-6, ..Default::default() };
//! let mut ransac = LoRansac::new(
//!     settings,
//!     Offset,
//!     UniformRandomSampler::from_seed(0),
//!     InlierCountScoring::new(1e-6),
//!     None::<NoopLocalOptimizer>,
//!     RansacTerminationCriterion::new(0.99, 3.0),
//! )
//! .unwrap();
//!
//! let p1 = [0.0, 1.0, 2.0, 3.0];
//! let p2 = [2.0, 3.0, 4.0, 9.0];
//! let report = ransac.estimate(&p1, &p2).unwrap();
//! assert!(report.success);
//! assert_eq!(report.model, 2.0);
//! assert_eq!(report.inlier_mask, vec![true, true, true, false]);
//! ```
//!
//! ## Modules
//!
//! - **[`api`](api)**: High-level estimation functions
//! - **[`choices`](choices)**: Runtime selection of pipeline components
//! - **[`core`](crate::core)**: Core traits and the `LoRansac` pipeline
//! - **[`estimators`](estimators)**: Built-in estimators
//! - **[`models`](models)**: Rigid transform model
//! - **[`optimisers`](optimisers)**: Local optimization strategies
//! - **[`samplers`](samplers)**: Built-in sampling strategies
//! - **[`scoring`](scoring)**: Built-in scoring strategies
//! - **[`settings`](settings)**: Configuration types

pub mod api;
pub mod choices;
pub mod core;
pub mod error;
pub mod estimators;
pub mod models;
pub mod optimisers;
pub mod samplers;
pub mod scoring;
pub mod settings;
pub mod types;
pub mod utils;

// Re-export high-level API
pub use api::{build_ransac, estimate_generalized_relative_pose, ConfiguredRansac};

// Re-export core traits for easy access
pub use self::core::{
    Estimator, Hypothesis, LoRansac, LocalOptimizer, Report, Sampler, Scoring,
    TerminationCriterion,
};

pub use error::{RansacError, SettingsError};
pub use estimators::GeneralizedRelativePoseEstimator;
pub use models::RigidTransform;
pub use settings::RansacSettings;
pub use types::Correspondence;

//! Observation types shared by the estimators.
//!
//! A generalized camera is a rig of several physical cameras. Every
//! observation therefore carries, next to its normalized image coordinate, the
//! pose of the sub-camera that captured it.

use crate::models::RigidTransform;
use nalgebra::{Vector2, Vector3};

/// One side of a 2D-2D correspondence between two rig instants.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Correspondence {
    /// `cam_from_rig`: places the capturing sub-camera relative to the rig frame.
    pub rel_tform: RigidTransform,
    /// Normalized image coordinate (camera-frame point divided by its depth).
    pub xy: Vector2<f64>,
}

/// Viewing ray in Plücker coordinates: unit direction and moment `c x q`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PluckerLine {
    pub direction: Vector3<f64>,
    pub moment: Vector3<f64>,
}

impl Correspondence {
    pub fn new(rel_tform: RigidTransform, xy: Vector2<f64>) -> Self {
        Self { rel_tform, xy }
    }

    /// Centre of the capturing sub-camera expressed in the rig frame.
    pub fn camera_center(&self) -> Vector3<f64> {
        self.rel_tform.inverse().translation
    }

    /// Viewing ray of this observation expressed in the rig frame.
    ///
    /// The direction is normalized; a zero-length bearing leaves it at zero,
    /// which the solvers treat as a degenerate row.
    pub fn ray(&self) -> PluckerLine {
        let bearing = self.xy.push(1.0);
        let direction = self
            .rel_tform
            .rotation
            .inverse_transform_vector(&bearing)
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        let moment = self.camera_center().cross(&direction);
        PluckerLine { direction, moment }
    }
}

//! Geometric models estimated by the pipeline.
//!
//! The only model in this crate is the 3D rigid transform relating the
//! reference frames of a multi-camera rig at two instants. It doubles as the
//! representation of every sub-camera's rig-local pose.

use nalgebra::{Matrix3, Matrix3x4, Matrix4, Rotation3, UnitQuaternion, Vector3};
use std::ops::Mul;

/// Rigid transform in 3D (rotation + translation).
///
/// Maps a point from frame `a` to frame `b` as `x_b = rotation * x_a + translation`.
/// Transforms are named after the frames they connect, e.g. `cam_from_rig`, so
/// that composition reads right to left: `cam_from_world = cam_from_rig * rig_from_world`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidTransform {
    pub rotation: UnitQuaternion<f64>,
    pub translation: Vector3<f64>,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    pub fn new(rotation: UnitQuaternion<f64>, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(UnitQuaternion::identity(), Vector3::zeros())
    }

    /// Build from a rotation matrix and translation vector.
    ///
    /// The rotation block is projected onto the closest unit quaternion, so a
    /// slightly non-orthogonal input is tolerated.
    pub fn from_rt(r: Matrix3<f64>, t: Vector3<f64>) -> Self {
        let rot = Rotation3::from_matrix(&r);
        Self::new(UnitQuaternion::from_rotation_matrix(&rot), t)
    }

    /// Build from the dense `[R | t]` form returned by [`RigidTransform::matrix`].
    pub fn from_matrix(m: &Matrix3x4<f64>) -> Self {
        let r: Matrix3<f64> = m.fixed_view::<3, 3>(0, 0).into_owned();
        let t: Vector3<f64> = m.column(3).into_owned();
        Self::from_rt(r, t)
    }

    /// Transform undoing this mapping, so that `t.inverse() * t` is the identity.
    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.inverse();
        let translation = rotation * -self.translation;
        Self::new(rotation, translation)
    }

    /// Dense `3x4` form: rotation block followed by the translation column.
    pub fn matrix(&self) -> Matrix3x4<f64> {
        let mut m = Matrix3x4::zeros();
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&self.rotation.to_rotation_matrix().into_inner());
        m.set_column(3, &self.translation);
        m
    }

    pub fn to_matrix4(&self) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 4>(0, 0).copy_from(&self.matrix());
        m
    }

    pub fn transform_point(&self, x: &Vector3<f64>) -> Vector3<f64> {
        self.rotation * x + self.translation
    }

    /// Compose `self` (as `c_from_b`) with `b_from_a`, yielding `c_from_a`.
    ///
    /// The product quaternion is renormalized; without it chained compositions
    /// slowly drift away from unit norm.
    pub fn compose(&self, b_from_a: &RigidTransform) -> RigidTransform {
        let mut rotation = self.rotation * b_from_a.rotation;
        rotation.renormalize();
        let translation = self.translation + self.rotation * b_from_a.translation;
        Self::new(rotation, translation)
    }
}

impl Mul<RigidTransform> for RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: RigidTransform) -> RigidTransform {
        self.compose(&rhs)
    }
}

impl<'a> Mul<&'a RigidTransform> for &'a RigidTransform {
    type Output = RigidTransform;

    fn mul(self, rhs: &'a RigidTransform) -> RigidTransform {
        self.compose(rhs)
    }
}

impl Mul<Vector3<f64>> for RigidTransform {
    type Output = Vector3<f64>;

    fn mul(self, rhs: Vector3<f64>) -> Vector3<f64> {
        self.transform_point(&rhs)
    }
}

impl<'a> Mul<&'a Vector3<f64>> for &'a RigidTransform {
    type Output = Vector3<f64>;

    fn mul(self, rhs: &'a Vector3<f64>) -> Vector3<f64> {
        self.transform_point(rhs)
    }
}

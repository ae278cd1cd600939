//! Rigid transforms

use std::ops::Mul;

use glam::{DMat3, DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use super::{GeomError, GeomResult};
use crate::constants::AXIS_TOLERANCE;

/// A rigid transform: a position plus an orientation.
///
/// `a * b` applies `b` first and then `a`, in `a`'s frame, which is the
/// product of the equivalent homogeneous matrices. Composition is
/// associative but not commutative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    position: DVec3,
    orientation: DQuat,
}

impl Default for Location {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Location {
    /// The identity transform
    pub const IDENTITY: Location = Location {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
    };

    /// Create a pure translation
    pub fn from_translation(position: impl Into<DVec3>) -> Self {
        Self {
            position: position.into(),
            orientation: DQuat::IDENTITY,
        }
    }

    /// Create a location from a position and intrinsic X→Y→Z rotations in degrees
    pub fn from_euler_deg(position: impl Into<DVec3>, rotation: impl Into<DVec3>) -> Self {
        let r = rotation.into();
        let orientation = DQuat::from_rotation_x(r.x.to_radians())
            * DQuat::from_rotation_y(r.y.to_radians())
            * DQuat::from_rotation_z(r.z.to_radians());
        Self {
            position: position.into(),
            orientation: orientation.normalize(),
        }
    }

    /// Create a rotation of `angle_deg` about `axis` through the origin
    pub fn from_axis_angle_deg(axis: DVec3, angle_deg: f64) -> GeomResult<Self> {
        let axis = axis.try_normalize().ok_or(GeomError::ZeroDirection)?;
        Ok(Self {
            position: DVec3::ZERO,
            orientation: DQuat::from_axis_angle(axis, angle_deg.to_radians()),
        })
    }

    /// Create a location from raw parts, rejecting degenerate input
    pub fn from_parts(position: DVec3, orientation: DQuat) -> GeomResult<Self> {
        Self {
            position,
            orientation,
        }
        .validated()
    }

    /// Create a location from an orthonormal rotation matrix and a position
    pub(crate) fn from_frame(position: DVec3, rotation: DMat3) -> Self {
        Self {
            position,
            orientation: DQuat::from_mat3(&rotation).normalize(),
        }
    }

    /// Check that this location is finite and its orientation is a unit quaternion
    pub fn validated(self) -> GeomResult<Self> {
        if !self.position.is_finite() {
            return Err(GeomError::DegenerateLocation(format!(
                "position {} is not finite",
                self.position
            )));
        }
        if !self.orientation.is_finite() {
            return Err(GeomError::DegenerateLocation(
                "orientation is not finite".into(),
            ));
        }
        let norm = self.orientation.length();
        if (norm - 1.0).abs() > AXIS_TOLERANCE.sqrt() {
            return Err(GeomError::DegenerateLocation(format!(
                "orientation quaternion has norm {norm}"
            )));
        }
        Ok(self)
    }

    /// Position component
    pub fn position(&self) -> DVec3 {
        self.position
    }

    /// Orientation component
    pub fn orientation(&self) -> DQuat {
        self.orientation
    }

    /// Rotation angles (intrinsic X→Y→Z) in degrees
    pub fn euler_deg(&self) -> DVec3 {
        let m = DMat3::from_quat(self.orientation);
        // r_ij lives in column j, row i
        let r02 = m.z_axis.x;
        let r12 = m.z_axis.y;
        let r22 = m.z_axis.z;
        let r01 = m.y_axis.x;
        let r00 = m.x_axis.x;
        let ry = r02.clamp(-1.0, 1.0).asin();
        let rx = (-r12).atan2(r22);
        let rz = (-r01).atan2(r00);
        DVec3::new(rx.to_degrees(), ry.to_degrees(), rz.to_degrees())
    }

    /// Compose two transforms: `other` first, then `self`
    pub fn compose(&self, other: &Location) -> Location {
        Location {
            position: self.position + self.orientation * other.position,
            orientation: (self.orientation * other.orientation).normalize(),
        }
    }

    /// The inverse transform, such that `self.compose(&self.inverse())` is identity
    pub fn inverse(&self) -> Location {
        let inv = self.orientation.conjugate();
        Location {
            position: -(inv * self.position),
            orientation: inv,
        }
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: DVec3) -> DVec3 {
        self.position + self.orientation * point
    }

    /// Apply the rotation part of this transform to a vector
    pub fn transform_vector(&self, vector: DVec3) -> DVec3 {
        self.orientation * vector
    }

    /// Homogeneous matrix of this transform
    pub fn to_matrix(&self) -> DMat4 {
        DMat4::from_rotation_translation(self.orientation, self.position)
    }

    /// Rotation matrix of this transform
    pub fn rotation_matrix(&self) -> DMat3 {
        DMat3::from_quat(self.orientation)
    }

    /// Compare two transforms within a tolerance
    pub fn approx_eq(&self, other: &Location, tolerance: f64) -> bool {
        self.position.abs_diff_eq(other.position, tolerance)
            && self
                .rotation_matrix()
                .abs_diff_eq(other.rotation_matrix(), tolerance)
    }

    /// Check whether this is the identity within a tolerance
    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.approx_eq(&Location::IDENTITY, tolerance)
    }
}

impl Mul<Location> for Location {
    type Output = Location;

    fn mul(self, rhs: Location) -> Location {
        self.compose(&rhs)
    }
}

impl Mul<&Location> for &Location {
    type Output = Location;

    fn mul(self, rhs: &Location) -> Location {
        self.compose(rhs)
    }
}

impl Mul<DVec3> for Location {
    type Output = DVec3;

    fn mul(self, rhs: DVec3) -> DVec3 {
        self.transform_point(rhs)
    }
}

impl From<DVec3> for Location {
    fn from(position: DVec3) -> Self {
        Self::from_translation(position)
    }
}

impl From<(f64, f64, f64)> for Location {
    fn from(position: (f64, f64, f64)) -> Self {
        Self::from_translation(position)
    }
}

impl From<[f64; 3]> for Location {
    fn from(position: [f64; 3]) -> Self {
        Self::from_translation(position)
    }
}

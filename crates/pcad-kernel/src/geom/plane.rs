//! Local coordinate frames

use std::ops::Mul;

use glam::{DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use super::{GeomError, GeomResult, Location};
use crate::constants::AXIS_TOLERANCE;

/// An origin plus an orthonormal frame (x direction and normal).
///
/// The y direction is derived as `z × x`. Planes are validated on
/// construction and never silently normalized.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    origin: DVec3,
    x_dir: DVec3,
    z_dir: DVec3,
}

impl Default for Plane {
    fn default() -> Self {
        Self::XY
    }
}

impl Plane {
    pub const XY: Plane = Plane::raw(DVec3::ZERO, DVec3::X, DVec3::Z);
    pub const YZ: Plane = Plane::raw(DVec3::ZERO, DVec3::Y, DVec3::X);
    pub const ZX: Plane = Plane::raw(DVec3::ZERO, DVec3::Z, DVec3::Y);
    pub const XZ: Plane = Plane::raw(DVec3::ZERO, DVec3::X, DVec3::NEG_Y);
    pub const YX: Plane = Plane::raw(DVec3::ZERO, DVec3::Y, DVec3::NEG_Z);
    pub const ZY: Plane = Plane::raw(DVec3::ZERO, DVec3::Z, DVec3::NEG_X);
    pub const FRONT: Plane = Plane::raw(DVec3::ZERO, DVec3::X, DVec3::NEG_Y);
    pub const BACK: Plane = Plane::raw(DVec3::ZERO, DVec3::NEG_X, DVec3::Y);
    pub const LEFT: Plane = Plane::raw(DVec3::ZERO, DVec3::NEG_Y, DVec3::NEG_X);
    pub const RIGHT: Plane = Plane::raw(DVec3::ZERO, DVec3::Y, DVec3::X);
    pub const TOP: Plane = Plane::raw(DVec3::ZERO, DVec3::X, DVec3::Z);
    pub const BOTTOM: Plane = Plane::raw(DVec3::ZERO, DVec3::X, DVec3::NEG_Z);

    const fn raw(origin: DVec3, x_dir: DVec3, z_dir: DVec3) -> Self {
        Self {
            origin,
            x_dir,
            z_dir,
        }
    }

    /// Create a plane, failing if the axes are not unit length or not perpendicular
    pub fn new(origin: DVec3, x_dir: DVec3, z_dir: DVec3) -> GeomResult<Self> {
        if !origin.is_finite() {
            return Err(GeomError::NonFinite("plane origin"));
        }
        if !x_dir.is_finite() || !z_dir.is_finite() {
            return Err(GeomError::NonFinite("plane axis"));
        }
        for (axis, dir) in [("x", x_dir), ("z", z_dir)] {
            let length = dir.length();
            if (length - 1.0).abs() > AXIS_TOLERANCE {
                return Err(GeomError::NonUnitAxis { axis, length });
            }
        }
        let dot = x_dir.dot(z_dir);
        if dot.abs() > AXIS_TOLERANCE {
            return Err(GeomError::NonOrthogonalAxes { dot });
        }
        Ok(Self::raw(origin, x_dir, z_dir))
    }

    /// Create a plane whose frame is the given location
    pub fn from_location(location: &Location) -> Self {
        Self::raw(
            location.position(),
            location.transform_vector(DVec3::X),
            location.transform_vector(DVec3::Z),
        )
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn x_dir(&self) -> DVec3 {
        self.x_dir
    }

    pub fn y_dir(&self) -> DVec3 {
        self.z_dir.cross(self.x_dir)
    }

    pub fn z_dir(&self) -> DVec3 {
        self.z_dir
    }

    /// The location whose frame coincides with this plane
    pub fn location(&self) -> Location {
        Location::from_frame(
            self.origin,
            DMat3::from_cols(self.x_dir, self.y_dir(), self.z_dir),
        )
    }

    /// Move this plane by a location expressed in the plane's own axes
    pub fn relocated(&self, location: &Location) -> Plane {
        Plane::from_location(&(self.location() * *location))
    }

    /// Shift the plane along its normal
    pub fn offset(&self, distance: f64) -> Plane {
        Self::raw(self.origin + self.z_dir * distance, self.x_dir, self.z_dir)
    }

    /// Move the origin to a point given in local coordinates
    pub fn shift_origin(&self, local: DVec3) -> Plane {
        Self::raw(self.from_local(local), self.x_dir, self.z_dir)
    }

    /// Rotate the plane about its own axes (intrinsic X→Y→Z, degrees)
    pub fn rotated_deg(&self, rotation: impl Into<DVec3>) -> Plane {
        self.relocated(&Location::from_euler_deg(DVec3::ZERO, rotation))
    }

    /// Convert a global point into this plane's coordinates
    pub fn to_local(&self, point: DVec3) -> DVec3 {
        let d = point - self.origin;
        DVec3::new(d.dot(self.x_dir), d.dot(self.y_dir()), d.dot(self.z_dir))
    }

    /// Convert a point in this plane's coordinates into global space
    pub fn from_local(&self, point: DVec3) -> DVec3 {
        self.origin + self.x_dir * point.x + self.y_dir() * point.y + self.z_dir * point.z
    }

    /// Project a global point onto the plane's 2D coordinates
    pub fn to_local_2d(&self, point: DVec3) -> DVec2 {
        self.to_local(point).truncate()
    }

    /// Lift 2D plane coordinates into global space
    pub fn from_local_2d(&self, point: DVec2) -> DVec3 {
        self.from_local(point.extend(0.0))
    }

    /// Compare two planes within a tolerance
    pub fn approx_eq(&self, other: &Plane, tolerance: f64) -> bool {
        self.origin.abs_diff_eq(other.origin, tolerance)
            && self.x_dir.abs_diff_eq(other.x_dir, tolerance)
            && self.z_dir.abs_diff_eq(other.z_dir, tolerance)
    }
}

impl Mul<Location> for Plane {
    type Output = Plane;

    fn mul(self, rhs: Location) -> Plane {
        self.relocated(&rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const TOL: f64 = 1e-9;

    #[test]
    fn test_named_planes_are_valid() {
        for plane in [
            Plane::XY,
            Plane::YZ,
            Plane::ZX,
            Plane::XZ,
            Plane::YX,
            Plane::ZY,
            Plane::FRONT,
            Plane::BACK,
            Plane::LEFT,
            Plane::RIGHT,
            Plane::TOP,
            Plane::BOTTOM,
        ] {
            assert!(Plane::new(plane.origin(), plane.x_dir(), plane.z_dir()).is_ok());
            assert_abs_diff_eq!(plane.y_dir().length(), 1.0, epsilon = TOL);
        }
    }

    #[test]
    fn test_malformed_planes_fail_fast() {
        let err = Plane::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0), DVec3::Z);
        assert!(matches!(err, Err(GeomError::NonUnitAxis { axis: "x", .. })));

        let skew = DVec3::new(1.0, 1.0, 0.0).normalize();
        let err = Plane::new(DVec3::ZERO, skew, DVec3::X);
        assert!(matches!(err, Err(GeomError::NonOrthogonalAxes { .. })));
    }

    #[test]
    fn test_local_round_trip() {
        let plane = Plane::new(
            DVec3::new(1.0, -2.0, 3.0),
            DVec3::Y,
            DVec3::new(1.0, 0.0, 1.0).normalize(),
        )
        .unwrap()
        .rotated_deg((15.0, -30.0, 45.0));

        for p in [
            DVec3::ZERO,
            DVec3::new(5.0, 1.0, -3.0),
            DVec3::new(-100.0, 0.25, 42.0),
        ] {
            let there = plane.from_local(plane.to_local(p));
            assert!(there.abs_diff_eq(p, TOL));
            let back = plane.to_local(plane.from_local(p));
            assert!(back.abs_diff_eq(p, TOL));
        }
    }

    #[test]
    fn test_location_matches_frame() {
        let plane = Plane::XZ.offset(4.0);
        let loc = plane.location();
        let p = DVec3::new(1.0, 2.0, 3.0);
        assert!(loc.transform_point(p).abs_diff_eq(plane.from_local(p), TOL));
        assert!(Plane::from_location(&loc).approx_eq(&plane, TOL));
    }

    #[test]
    fn test_relocation_is_plane_relative() {
        // Moving +x on the YZ plane moves along global +Y
        let moved = Plane::YZ * Location::from_translation((2.0, 0.0, 0.0));
        assert!(moved.origin().abs_diff_eq(DVec3::new(0.0, 2.0, 0.0), TOL));

        // Moving +z on XZ moves along global -Y
        let moved = Plane::XZ.relocated(&Location::from_translation((0.0, 0.0, 1.0)));
        assert!(moved.origin().abs_diff_eq(DVec3::new(0.0, -1.0, 0.0), TOL));
        assert!(moved.z_dir().abs_diff_eq(DVec3::NEG_Y, TOL));
    }
}

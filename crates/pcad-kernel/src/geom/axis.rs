//! Directed axes

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::{GeomError, GeomResult, Location};

/// A line through `origin` with a unit `direction`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    origin: DVec3,
    direction: DVec3,
}

impl Axis {
    pub const X: Axis = Axis {
        origin: DVec3::ZERO,
        direction: DVec3::X,
    };
    pub const Y: Axis = Axis {
        origin: DVec3::ZERO,
        direction: DVec3::Y,
    };
    pub const Z: Axis = Axis {
        origin: DVec3::ZERO,
        direction: DVec3::Z,
    };

    /// Create an axis; the direction is normalized
    pub fn new(origin: DVec3, direction: DVec3) -> GeomResult<Self> {
        if !origin.is_finite() || !direction.is_finite() {
            return Err(GeomError::NonFinite("axis"));
        }
        let direction = direction.try_normalize().ok_or(GeomError::ZeroDirection)?;
        Ok(Self { origin, direction })
    }

    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    pub fn direction(&self) -> DVec3 {
        self.direction
    }

    /// Signed distance of a point's projection along the axis
    pub fn project(&self, point: DVec3) -> f64 {
        (point - self.origin).dot(self.direction)
    }

    /// Check whether a direction is parallel (or anti-parallel) to this axis
    pub fn is_parallel(&self, direction: DVec3, tolerance: f64) -> bool {
        match direction.try_normalize() {
            Some(d) => d.cross(self.direction).length() <= tolerance,
            None => false,
        }
    }

    /// The axis moved by a location
    pub fn located(&self, location: &Location) -> Axis {
        Axis {
            origin: location.transform_point(self.origin),
            direction: location.transform_vector(self.direction),
        }
    }
}

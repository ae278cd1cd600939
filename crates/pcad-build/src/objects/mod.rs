//! Objects that build a shape and feed it to the nearest builder
//!
//! Each object builds its shape in its own frame: aligned about the origin,
//! then rotated. The context places the result at every active location.

mod curves;
mod sketch;
mod solids;

pub use curves::{Line, Polyline};
pub use sketch::{Circle, Polygon, Rectangle, RegularPolygon};
pub use solids::{Cuboid, Cylinder, Sphere};

use glam::DVec3;
use pcad_kernel::{BoundingBox, Location};
use serde::{Deserialize, Serialize};

use crate::builder::BuilderKind;
use crate::error::BuildResult;
use crate::mode::Mode;
use crate::shape::{Kernel, Shape};

/// Something that can be added to a builder
pub trait BuildObject {
    /// Short name used in error messages
    fn name(&self) -> &'static str;

    /// The builder this object belongs to
    fn builder_kind(&self) -> BuilderKind;

    fn mode(&self) -> Mode;

    /// Build the shape in the object's own frame
    fn build(&self, kernel: &Kernel) -> BuildResult<Shape>;
}

/// Where an object sits relative to the origin along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Align {
    /// The object's minimum touches the origin
    Min,
    #[default]
    Center,
    /// The object's maximum touches the origin
    Max,
}

impl Align {
    /// Shift that aligns the span `[min, max]`
    pub fn offset(self, min: f64, max: f64) -> f64 {
        match self {
            Align::Min => -min,
            Align::Center => -(min + max) / 2.0,
            Align::Max => -max,
        }
    }
}

/// Shift that aligns a bounding box on each axis
pub(crate) fn align_offset(bbox: &BoundingBox, align: [Align; 3]) -> DVec3 {
    DVec3::new(
        align[0].offset(bbox.min.x, bbox.max.x),
        align[1].offset(bbox.min.y, bbox.max.y),
        align[2].offset(bbox.min.z, bbox.max.z),
    )
}

/// Align a freshly built shape, then rotate it about the origin
pub(crate) fn align_and_rotate(
    shape: Shape,
    align: Option<[Align; 3]>,
    rotation_deg: DVec3,
) -> BuildResult<Shape> {
    let offset = align.map_or(DVec3::ZERO, |align| align_offset(&shape.bounding_box(), align));
    let location =
        Location::from_euler_deg(DVec3::ZERO, rotation_deg) * Location::from_translation(offset);
    if location.is_identity(0.0) {
        return Ok(shape);
    }
    Ok(shape.moved(&location)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_offsets() {
        assert_eq!(Align::Min.offset(-1.0, 3.0), 1.0);
        assert_eq!(Align::Center.offset(-1.0, 3.0), -1.0);
        assert_eq!(Align::Max.offset(-1.0, 3.0), -3.0);
    }

    #[test]
    fn test_align_and_rotate_order() {
        let kernel = Kernel::csg();
        let cube = kernel.cuboid(DVec3::new(2.0, 4.0, 6.0)).unwrap();
        // Min on X moves the box to x in [0, 2]; a quarter turn about Z maps that onto y
        let placed = align_and_rotate(
            cube,
            Some([Align::Min, Align::Center, Align::Center]),
            DVec3::new(0.0, 0.0, 90.0),
        )
        .unwrap();
        let bbox = placed.bounding_box();
        assert!(bbox.min.abs_diff_eq(DVec3::new(-2.0, 0.0, -3.0), 1e-9));
        assert!(bbox.max.abs_diff_eq(DVec3::new(2.0, 2.0, 3.0), 1e-9));
    }
}

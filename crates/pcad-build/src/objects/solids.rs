//! Solid primitives

use glam::DVec3;

use super::{Align, BuildObject, align_and_rotate};
use crate::builder::BuilderKind;
use crate::error::BuildResult;
use crate::mode::Mode;
use crate::shape::{Kernel, Shape};

const CENTERED: [Align; 3] = [Align::Center; 3];

/// A box
#[derive(Debug, Clone, PartialEq)]
pub struct Cuboid {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Euler angles in degrees, applied after alignment
    pub rotation: DVec3,
    pub align: [Align; 3],
    pub mode: Mode,
}

impl Cuboid {
    pub fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
            rotation: DVec3::ZERO,
            align: CENTERED,
            mode: Mode::Add,
        }
    }

    pub fn rotation(mut self, degrees: impl Into<DVec3>) -> Self {
        self.rotation = degrees.into();
        self
    }

    pub fn align(mut self, align: [Align; 3]) -> Self {
        self.align = align;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildObject for Cuboid {
    fn name(&self) -> &'static str {
        "Cuboid"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Part
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        let solid = kernel.cuboid(DVec3::new(self.length, self.width, self.height))?;
        align_and_rotate(solid, Some(self.align), self.rotation)
    }
}

/// A cylinder along Z
#[derive(Debug, Clone, PartialEq)]
pub struct Cylinder {
    pub radius: f64,
    pub height: f64,
    pub rotation: DVec3,
    pub align: [Align; 3],
    pub mode: Mode,
}

impl Cylinder {
    pub fn new(radius: f64, height: f64) -> Self {
        Self {
            radius,
            height,
            rotation: DVec3::ZERO,
            align: CENTERED,
            mode: Mode::Add,
        }
    }

    pub fn rotation(mut self, degrees: impl Into<DVec3>) -> Self {
        self.rotation = degrees.into();
        self
    }

    pub fn align(mut self, align: [Align; 3]) -> Self {
        self.align = align;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildObject for Cylinder {
    fn name(&self) -> &'static str {
        "Cylinder"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Part
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        let solid = kernel.cylinder(self.radius, self.height)?;
        align_and_rotate(solid, Some(self.align), self.rotation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub radius: f64,
    pub align: [Align; 3],
    pub mode: Mode,
}

impl Sphere {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            align: CENTERED,
            mode: Mode::Add,
        }
    }

    pub fn align(mut self, align: [Align; 3]) -> Self {
        self.align = align;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildObject for Sphere {
    fn name(&self) -> &'static str {
        "Sphere"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Part
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        let solid = kernel.sphere(self.radius)?;
        align_and_rotate(solid, Some(self.align), DVec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cuboid_sits_on_origin() {
        let kernel = Kernel::csg();
        let cuboid = Cuboid::new(10.0, 10.0, 5.0)
            .align([Align::Center, Align::Center, Align::Min])
            .build(&kernel)
            .unwrap();
        let bbox = cuboid.bounding_box();
        assert_relative_eq!(bbox.min.z, 0.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.z, 5.0, epsilon = 1e-12);
        assert_relative_eq!(cuboid.volume().unwrap(), 500.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rotated_cylinder_lies_along_x() {
        let kernel = Kernel::csg();
        let cylinder = Cylinder::new(1.0, 6.0)
            .rotation((0.0, 90.0, 0.0))
            .build(&kernel)
            .unwrap();
        let size = cylinder.bounding_box().size();
        assert_relative_eq!(size.x, 6.0, epsilon = 1e-9);
        assert_relative_eq!(cylinder.volume().unwrap(), 6.0 * std::f64::consts::PI, epsilon = 1e-9);
    }

    #[test]
    fn test_sphere_aligned_to_max() {
        let kernel = Kernel::csg();
        let sphere = Sphere::new(2.0)
            .align([Align::Max; 3])
            .build(&kernel)
            .unwrap();
        assert!(sphere.center().abs_diff_eq(DVec3::splat(-2.0), 1e-12));
    }
}

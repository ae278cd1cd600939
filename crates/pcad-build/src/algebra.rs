//! Operators for combining and placing shapes without a builder
//!
//! `+`, `-` and `&` combine through the same engine the builders use; `*`
//! places a shape at a location or on a plane. The operators refuse to run
//! while any builder scope is open on the current thread.

use std::ops::{Add, BitAnd, Mul, Neg, Sub};

use pcad_kernel::{Location, Plane};

use crate::combine::combine;
use crate::context::open_builder_count;
use crate::error::{BuildError, BuildResult};
use crate::mode::Mode;
use crate::shape::Shape;

fn ensure_no_builder(op: &'static str) -> BuildResult<()> {
    match open_builder_count() {
        0 => Ok(()),
        builders => Err(BuildError::AlgebraInsideBuilder { op, builders }),
    }
}

fn binary(op: &'static str, a: &Shape, b: &Shape, mode: Mode) -> BuildResult<Shape> {
    ensure_no_builder(op)?;
    let result = combine(a.kernel(), Some(a), b, mode)?;
    Ok(result.unwrap_or_else(|| a.clone()))
}

fn place(op: &'static str, location: &Location, shape: &Shape) -> BuildResult<Shape> {
    ensure_no_builder(op)?;
    Ok(shape.moved(location)?)
}

/// A shape marked for removal by unary minus, so `&a + -&b` is `a - b`
#[derive(Debug, Clone)]
pub struct Subtractive(pub Shape);

impl Neg for &Shape {
    type Output = Subtractive;

    fn neg(self) -> Subtractive {
        Subtractive(self.clone())
    }
}

impl Neg for Shape {
    type Output = Subtractive;

    fn neg(self) -> Subtractive {
        Subtractive(self)
    }
}

macro_rules! combine_operator {
    ($trait:ident, $method:ident, $symbol:literal, $mode:expr) => {
        impl $trait<&Shape> for &Shape {
            type Output = BuildResult<Shape>;

            fn $method(self, rhs: &Shape) -> BuildResult<Shape> {
                binary($symbol, self, rhs, $mode)
            }
        }

        impl $trait<Shape> for Shape {
            type Output = BuildResult<Shape>;

            fn $method(self, rhs: Shape) -> BuildResult<Shape> {
                binary($symbol, &self, &rhs, $mode)
            }
        }

        impl $trait<&Shape> for Shape {
            type Output = BuildResult<Shape>;

            fn $method(self, rhs: &Shape) -> BuildResult<Shape> {
                binary($symbol, &self, rhs, $mode)
            }
        }
    };
}

combine_operator!(Add, add, "+", Mode::Add);
combine_operator!(Sub, sub, "-", Mode::Subtract);
combine_operator!(BitAnd, bitand, "&", Mode::Intersect);

impl Add<Subtractive> for &Shape {
    type Output = BuildResult<Shape>;

    fn add(self, rhs: Subtractive) -> BuildResult<Shape> {
        binary("-", self, &rhs.0, Mode::Subtract)
    }
}

impl Add<Subtractive> for Shape {
    type Output = BuildResult<Shape>;

    fn add(self, rhs: Subtractive) -> BuildResult<Shape> {
        binary("-", &self, &rhs.0, Mode::Subtract)
    }
}

impl Mul<&Shape> for Location {
    type Output = BuildResult<Shape>;

    fn mul(self, rhs: &Shape) -> BuildResult<Shape> {
        place("*", &self, rhs)
    }
}

impl Mul<Shape> for Location {
    type Output = BuildResult<Shape>;

    fn mul(self, rhs: Shape) -> BuildResult<Shape> {
        place("*", &self, &rhs)
    }
}

impl Mul<&Shape> for Plane {
    type Output = BuildResult<Shape>;

    fn mul(self, rhs: &Shape) -> BuildResult<Shape> {
        place("*", &self.location(), rhs)
    }
}

impl Mul<Shape> for Plane {
    type Output = BuildResult<Shape>;

    fn mul(self, rhs: Shape) -> BuildResult<Shape> {
        place("*", &self.location(), &rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::BuildPart;
    use crate::shape::Kernel;
    use glam::DVec3;

    fn shapes() -> (Shape, Shape) {
        let kernel = Kernel::csg();
        let a = kernel.cuboid(DVec3::splat(2.0)).unwrap();
        let b = kernel.cuboid(DVec3::splat(2.0)).unwrap();
        let b = (Location::from_translation((1.0, 0.0, 0.0)) * &b).unwrap();
        (a, b)
    }

    #[test]
    fn test_operators_combine() {
        let (a, b) = shapes();
        let sum = (&a + &b).unwrap();
        assert!(sum.contains(DVec3::new(1.8, 0.0, 0.0)));
        let difference = (&a - &b).unwrap();
        assert!(!difference.contains(DVec3::new(0.5, 0.0, 0.0)));
        assert!(difference.contains(DVec3::new(-0.5, 0.0, 0.0)));
        let common = (&a & &b).unwrap();
        assert!(common.contains(DVec3::new(0.5, 0.0, 0.0)));
        assert!(!common.contains(DVec3::new(-0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_unary_minus_subtracts() {
        let (a, b) = shapes();
        let difference = (&a + -&b).unwrap();
        assert!(!difference.contains(DVec3::new(0.5, 0.0, 0.0)));
        assert!(difference.contains(DVec3::new(-0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_plane_places_shape() {
        let kernel = Kernel::csg();
        let disk = kernel.disk(1.0).unwrap();
        let placed = (Plane::YZ * &disk).unwrap();
        assert!(placed.direction().unwrap().abs_diff_eq(DVec3::X, 1e-12));
    }

    #[test]
    fn test_operators_refused_inside_builder() {
        let ctx = crate::context::BuildContext::new();
        let (a, b) = shapes();
        let part = BuildPart::enter(&ctx).unwrap();
        assert!(matches!(
            &a + &b,
            Err(BuildError::AlgebraInsideBuilder { op: "+", builders: 1 })
        ));
        assert!(matches!(
            Location::IDENTITY * &a,
            Err(BuildError::AlgebraInsideBuilder { op: "*", .. })
        ));
        part.finish().unwrap();
        assert!((&a + &b).is_ok());
    }
}

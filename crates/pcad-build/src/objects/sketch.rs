//! Planar objects, built in the XY plane

use std::f64::consts::TAU;

use glam::{DVec2, DVec3};
use pcad_kernel::CadError;

use super::{Align, BuildObject, align_and_rotate};
use crate::builder::BuilderKind;
use crate::error::BuildResult;
use crate::mode::Mode;
use crate::shape::{Kernel, Shape};

fn planar_align(align: (Align, Align)) -> [Align; 3] {
    [align.0, align.1, Align::Center]
}

fn about_z(rotation: f64) -> DVec3 {
    DVec3::new(0.0, 0.0, rotation)
}

/// An axis-aligned rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub width: f64,
    pub height: f64,
    /// Degrees about Z
    pub rotation: f64,
    pub align: (Align, Align),
    pub mode: Mode,
}

impl Rectangle {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            rotation: 0.0,
            align: (Align::Center, Align::Center),
            mode: Mode::Add,
        }
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn align(mut self, x: Align, y: Align) -> Self {
        self.align = (x, y);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildObject for Rectangle {
    fn name(&self) -> &'static str {
        "Rectangle"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Sketch
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        let (w, h) = (self.width / 2.0, self.height / 2.0);
        let face = kernel.polygon(&[
            DVec2::new(-w, -h),
            DVec2::new(w, -h),
            DVec2::new(w, h),
            DVec2::new(-w, h),
        ])?;
        align_and_rotate(face, Some(planar_align(self.align)), about_z(self.rotation))
    }
}

/// A filled circle
#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub radius: f64,
    pub align: (Align, Align),
    pub mode: Mode,
}

impl Circle {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            align: (Align::Center, Align::Center),
            mode: Mode::Add,
        }
    }

    pub fn align(mut self, x: Align, y: Align) -> Self {
        self.align = (x, y);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildObject for Circle {
    fn name(&self) -> &'static str {
        "Circle"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Sketch
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        let face = kernel.disk(self.radius)?;
        align_and_rotate(face, Some(planar_align(self.align)), DVec3::ZERO)
    }
}

/// A regular polygon inscribed in a circle, first vertex on +X
#[derive(Debug, Clone, PartialEq)]
pub struct RegularPolygon {
    pub radius: f64,
    pub sides: usize,
    pub rotation: f64,
    pub align: (Align, Align),
    pub mode: Mode,
}

impl RegularPolygon {
    pub fn new(radius: f64, sides: usize) -> Self {
        Self {
            radius,
            sides,
            rotation: 0.0,
            align: (Align::Center, Align::Center),
            mode: Mode::Add,
        }
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn align(mut self, x: Align, y: Align) -> Self {
        self.align = (x, y);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn vertices(&self) -> Vec<DVec2> {
        (0..self.sides)
            .map(|i| {
                let angle = TAU * i as f64 / self.sides as f64;
                DVec2::new(self.radius * angle.cos(), self.radius * angle.sin())
            })
            .collect()
    }
}

impl BuildObject for RegularPolygon {
    fn name(&self) -> &'static str {
        "RegularPolygon"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Sketch
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        if self.sides < 3 {
            return Err(CadError::InvalidProfile(format!(
                "a regular polygon needs at least 3 sides, got {}",
                self.sides
            ))
            .into());
        }
        let face = kernel.polygon(&self.vertices())?;
        align_and_rotate(face, Some(planar_align(self.align)), about_z(self.rotation))
    }
}

/// A face bounded by straight edges through the given points
///
/// Points are used as given unless an alignment is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub points: Vec<DVec2>,
    pub rotation: f64,
    pub align: Option<(Align, Align)>,
    pub mode: Mode,
}

impl Polygon {
    pub fn new<P: Into<DVec2>>(points: impl IntoIterator<Item = P>) -> Self {
        Self {
            points: points.into_iter().map(Into::into).collect(),
            rotation: 0.0,
            align: None,
            mode: Mode::Add,
        }
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn align(mut self, x: Align, y: Align) -> Self {
        self.align = Some((x, y));
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildObject for Polygon {
    fn name(&self) -> &'static str {
        "Polygon"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Sketch
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        let face = kernel.polygon(&self.points)?;
        align_and_rotate(face, self.align.map(planar_align), about_z(self.rotation))
    }
}

//! One-dimensional objects

use glam::DVec3;
use pcad_kernel::CadError;

use super::BuildObject;
use crate::builder::BuilderKind;
use crate::error::BuildResult;
use crate::mode::Mode;
use crate::shape::{Kernel, Shape};

/// A straight edge between two points
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub start: DVec3,
    pub end: DVec3,
    pub mode: Mode,
}

impl Line {
    pub fn new(start: impl Into<DVec3>, end: impl Into<DVec3>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            mode: Mode::Add,
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildObject for Line {
    fn name(&self) -> &'static str {
        "Line"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Line
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        Ok(kernel.line(self.start, self.end)?)
    }
}

/// Connected straight edges through a list of points
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<DVec3>,
    /// Join the last point back to the first
    pub close: bool,
    pub mode: Mode,
}

impl Polyline {
    pub fn new<P: Into<DVec3>>(points: impl IntoIterator<Item = P>) -> Self {
        Self {
            points: points.into_iter().map(Into::into).collect(),
            close: false,
            mode: Mode::Add,
        }
    }

    pub fn close(mut self, close: bool) -> Self {
        self.close = close;
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

impl BuildObject for Polyline {
    fn name(&self) -> &'static str {
        "Polyline"
    }

    fn builder_kind(&self) -> BuilderKind {
        BuilderKind::Line
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn build(&self, kernel: &Kernel) -> BuildResult<Shape> {
        if self.points.len() < 2 {
            return Err(CadError::InvalidProfile(format!(
                "polyline needs at least 2 points, got {}",
                self.points.len()
            ))
            .into());
        }
        let mut points = self.points.clone();
        if self.close && points.len() > 2 {
            points.push(self.points[0]);
        }
        let edges = points
            .windows(2)
            .map(|pair| kernel.line(pair[0], pair[1]))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(kernel.wire(&edges)?)
    }
}

//! Constructive Solid Geometry reference kernel
//!
//! Pure Rust kernel built on trees of analytic primitives. Membership and
//! primitive measures are exact; measures of boolean results are sampled on
//! a regular grid, and their topology is approximated by the operand faces
//! and edges that touch the result boundary.

mod node;
mod shape;

pub use shape::CsgShape;

use std::sync::Arc;

use glam::{DMat3, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use self::node::{CsgNode, Region2d, signed_area};
use super::{BooleanType, CadError, CadKernel, CadResult, NativeRef, NativeShape, ShapeKind};
use crate::constants::{DEFAULT_SAMPLE_RESOLUTION, DEFAULT_TOLERANCE};
use crate::geom::Location;

/// Tuning for the CSG kernel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsgKernelConfig {
    /// Samples per axis when measuring boolean results
    pub resolution: usize,
    /// Linear tolerance for membership and coincidence tests
    pub tolerance: f64,
}

impl Default for CsgKernelConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_SAMPLE_RESOLUTION,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// CSG-based CAD kernel
#[derive(Debug, Clone, Default)]
pub struct CsgKernel {
    config: CsgKernelConfig,
}

impl CsgKernel {
    /// Create a kernel with the given configuration
    pub fn new(config: CsgKernelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> CsgKernelConfig {
        self.config
    }

    fn wrap(&self, node: CsgNode) -> NativeRef {
        Arc::new(CsgShape::new(node, self.config))
    }

    fn downcast<'a>(&self, shape: &'a dyn NativeShape) -> CadResult<&'a CsgShape> {
        shape
            .as_any()
            .downcast_ref::<CsgShape>()
            .ok_or_else(|| CadError::ForeignShape(self.name().to_string()))
    }

    fn positive(value: f64, what: &str) -> CadResult<f64> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(CadError::InvalidProfile(format!(
                "{what} must be positive (got {value})"
            )))
        }
    }

    fn boolean_csg(&self, a: &CsgShape, b: &CsgShape, op: BooleanType) -> CadResult<CsgShape> {
        let (da, db) = (a.dimension(), b.dimension());
        if da < 2 {
            return Err(CadError::UnsupportedShape {
                op: "boolean",
                kind: a.kind(),
            });
        }
        if da != db {
            return Err(CadError::BooleanFailed(format!(
                "cannot {op} a {} with a {}",
                a.kind(),
                b.kind()
            )));
        }
        if da == 2 {
            let (Some(pa), Some(pb)) = (a.plane(), b.plane()) else {
                return Err(CadError::BooleanFailed("faces must be planar".into()));
            };
            let parallel = pa.z_dir().cross(pb.z_dir()).length() <= self.config.tolerance;
            let offset = pa.to_local(pb.origin()).z.abs();
            if !parallel || offset > self.config.tolerance {
                return Err(CadError::BooleanFailed("faces are not coplanar".into()));
            }
        }
        tracing::trace!("csg {op}: {} with {}", a.kind(), b.kind());
        Ok(CsgShape::new(
            CsgNode::Boolean {
                op,
                a: a.clone(),
                b: b.clone(),
            },
            self.config,
        ))
    }

    /// Fuse a non-empty slice as a balanced tree
    fn union_tree(&self, shapes: &[CsgShape]) -> CadResult<CsgShape> {
        match shapes {
            [] => Err(CadError::BooleanFailed("nothing to fuse".into())),
            [single] => Ok(single.clone()),
            _ => {
                let (left, right) = shapes.split_at(shapes.len() / 2);
                let left = self.union_tree(left)?;
                let right = self.union_tree(right)?;
                self.boolean_csg(&left, &right, BooleanType::Union)
            }
        }
    }

    fn extrude_csg(&self, face: &CsgShape, direction: DVec3) -> CadResult<CsgShape> {
        let local = face.location().inverse().transform_vector(direction);
        let node = match face.node() {
            CsgNode::Planar(region) => {
                let height = local.z;
                let sideways = local.truncate().length();
                if height.abs() <= self.config.tolerance
                    || sideways > self.config.tolerance * direction.length().max(1.0)
                {
                    return Err(CadError::OperationFailed(
                        "extrusion direction must be normal to the face".into(),
                    ));
                }
                CsgNode::Prism {
                    profile: region.clone(),
                    height,
                }
            }
            CsgNode::Boolean { op, a, b } if face.dimension() == 2 => CsgNode::Boolean {
                op: *op,
                a: self.extrude_csg(a, local)?,
                b: self.extrude_csg(b, local)?,
            },
            CsgNode::Compound(children) => CsgNode::Compound(
                children
                    .iter()
                    .map(|c| self.extrude_csg(c, local))
                    .collect::<CadResult<_>>()?,
            ),
            _ => {
                return Err(CadError::UnsupportedShape {
                    op: "extrude",
                    kind: face.kind(),
                });
            }
        };
        Ok(CsgShape::placed(node, face.location(), self.config))
    }

    /// Order segment end points into a closed loop
    fn chain_segments(&self, mut segments: Vec<(DVec3, DVec3)>) -> CadResult<Vec<DVec3>> {
        let tol = self.config.tolerance;
        if segments.is_empty() {
            return Err(CadError::InvalidProfile("no edges to build a face".into()));
        }
        let (start, mut cursor) = segments.remove(0);
        let mut points = vec![start];
        while !segments.is_empty() {
            let index = segments
                .iter()
                .position(|(s, e)| s.distance(cursor) <= tol || e.distance(cursor) <= tol)
                .ok_or_else(|| {
                    CadError::InvalidProfile("edges do not form a connected chain".into())
                })?;
            let (s, e) = segments.remove(index);
            points.push(cursor);
            cursor = if s.distance(cursor) <= tol { e } else { s };
        }
        if cursor.distance(start) > tol {
            return Err(CadError::InvalidProfile("edge chain is not closed".into()));
        }
        if points.len() < 3 {
            return Err(CadError::InvalidProfile(
                "a face needs at least three edges".into(),
            ));
        }
        Ok(points)
    }
}

impl CadKernel for CsgKernel {
    fn name(&self) -> &str {
        "csg"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn make_vertex(&self, point: DVec3) -> CadResult<NativeRef> {
        if !point.is_finite() {
            return Err(CadError::OperationFailed("vertex is not finite".into()));
        }
        Ok(self.wrap(CsgNode::Vertex(point)))
    }

    fn make_line(&self, start: DVec3, end: DVec3) -> CadResult<NativeRef> {
        if !start.is_finite() || !end.is_finite() {
            return Err(CadError::InvalidProfile("line end point is not finite".into()));
        }
        if start.distance(end) <= self.config.tolerance {
            return Err(CadError::InvalidProfile("line end points coincide".into()));
        }
        Ok(self.wrap(CsgNode::Segment { start, end }))
    }

    fn make_wire(&self, edges: &[NativeRef]) -> CadResult<NativeRef> {
        if edges.is_empty() {
            return Err(CadError::InvalidProfile("a wire needs at least one edge".into()));
        }
        let edges = edges
            .iter()
            .map(|e| {
                let e = self.downcast(e.as_ref())?;
                if e.dimension() != 1 {
                    return Err(CadError::UnsupportedShape {
                        op: "make_wire",
                        kind: e.kind(),
                    });
                }
                Ok(e.clone())
            })
            .collect::<CadResult<Vec<_>>>()?;
        Ok(self.wrap(CsgNode::Wire(edges)))
    }

    fn make_circle(&self, radius: f64) -> CadResult<NativeRef> {
        let radius = Self::positive(radius, "circle radius")?;
        Ok(self.wrap(CsgNode::Circle { radius }))
    }

    fn make_polygon(&self, points: &[DVec2]) -> CadResult<NativeRef> {
        if points.len() < 3 {
            return Err(CadError::InvalidProfile(format!(
                "polygon needs at least 3 points (got {})",
                points.len()
            )));
        }
        let area = signed_area(points);
        if area.abs() <= self.config.tolerance {
            return Err(CadError::InvalidProfile("polygon has zero area".into()));
        }
        let mut points = points.to_vec();
        if area < 0.0 {
            points.reverse();
        }
        Ok(self.wrap(CsgNode::Planar(Region2d::Polygon(points))))
    }

    fn make_disk(&self, radius: f64) -> CadResult<NativeRef> {
        let radius = Self::positive(radius, "disk radius")?;
        Ok(self.wrap(CsgNode::Planar(Region2d::Disk { radius })))
    }

    fn make_box(&self, size: DVec3) -> CadResult<NativeRef> {
        for (axis, value) in ["length", "width", "height"].iter().zip(size.to_array()) {
            Self::positive(value, &format!("box {axis}"))?;
        }
        Ok(self.wrap(CsgNode::Cuboid { size }))
    }

    fn make_sphere(&self, radius: f64) -> CadResult<NativeRef> {
        let radius = Self::positive(radius, "sphere radius")?;
        Ok(self.wrap(CsgNode::Sphere { radius }))
    }

    fn make_cylinder(&self, radius: f64, height: f64) -> CadResult<NativeRef> {
        let radius = Self::positive(radius, "cylinder radius")?;
        let height = Self::positive(height, "cylinder height")?;
        Ok(self.wrap(CsgNode::Cylinder { radius, height }))
    }

    fn make_face(&self, edges: &[NativeRef]) -> CadResult<NativeRef> {
        let mut flat = Vec::new();
        for edge in edges {
            let edge = self.downcast(edge.as_ref())?;
            if edge.dimension() != 1 {
                return Err(CadError::UnsupportedShape {
                    op: "make_face",
                    kind: edge.kind(),
                });
            }
            flat.extend(edge.sub_shapes_csg(ShapeKind::Edge));
        }

        if let [single] = flat.as_slice()
            && let CsgNode::Circle { radius } = single.node()
        {
            return Ok(Arc::new(CsgShape::placed(
                CsgNode::Planar(Region2d::Disk { radius: *radius }),
                single.location(),
                self.config,
            )));
        }

        let segments = flat
            .iter()
            .map(|e| match e.node() {
                CsgNode::Segment { start, end } => Ok((
                    e.location().transform_point(*start),
                    e.location().transform_point(*end),
                )),
                _ => Err(CadError::InvalidProfile(
                    "only straight edges or a single circle can bound a face".into(),
                )),
            })
            .collect::<CadResult<Vec<_>>>()?;
        let points = self.chain_segments(segments)?;

        // Newell normal follows the loop's winding
        let n = points.len();
        let normal: DVec3 = (0..n).map(|i| points[i].cross(points[(i + 1) % n])).sum();
        let normal = normal
            .try_normalize()
            .ok_or_else(|| CadError::InvalidProfile("edge loop encloses no area".into()))?;
        let origin = points.iter().copied().sum::<DVec3>() / n as f64;
        if points
            .iter()
            .any(|p| (*p - origin).dot(normal).abs() > self.config.tolerance * 1e3)
        {
            return Err(CadError::InvalidProfile("edges are not coplanar".into()));
        }
        let x_dir = (points[1] - points[0])
            .reject_from(normal)
            .try_normalize()
            .ok_or_else(|| CadError::InvalidProfile("degenerate edge in loop".into()))?;
        let location = Location::from_frame(
            origin,
            DMat3::from_cols(x_dir, normal.cross(x_dir), normal),
        );
        let inverse = location.inverse();
        let local: Vec<DVec2> = points
            .iter()
            .map(|p| inverse.transform_point(*p).truncate())
            .collect();

        tracing::debug!("csg face from {} edges", n);
        Ok(Arc::new(CsgShape::placed(
            CsgNode::Planar(Region2d::Polygon(local)),
            location,
            self.config,
        )))
    }

    fn extrude(&self, face: &dyn NativeShape, direction: DVec3) -> CadResult<NativeRef> {
        let face = self.downcast(face)?;
        if face.dimension() != 2 {
            return Err(CadError::UnsupportedShape {
                op: "extrude",
                kind: face.kind(),
            });
        }
        Ok(Arc::new(self.extrude_csg(face, direction)?))
    }

    fn transform(&self, shape: &dyn NativeShape, location: &Location) -> CadResult<NativeRef> {
        let shape = self.downcast(shape)?;
        Ok(Arc::new(shape.located(location)))
    }

    fn boolean(
        &self,
        a: &dyn NativeShape,
        b: &dyn NativeShape,
        op: BooleanType,
    ) -> CadResult<NativeRef> {
        let (a, b) = (self.downcast(a)?, self.downcast(b)?);
        Ok(Arc::new(self.boolean_csg(a, b, op)?))
    }

    fn boolean_many(
        &self,
        base: &NativeRef,
        tools: &[NativeRef],
        op: BooleanType,
    ) -> CadResult<NativeRef> {
        if tools.is_empty() {
            return Ok(Arc::clone(base));
        }
        let base = self.downcast(base.as_ref())?.clone();
        let tools = tools
            .iter()
            .map(|t| self.downcast(t.as_ref()).cloned())
            .collect::<CadResult<Vec<_>>>()?;

        let result = match op {
            BooleanType::Union => {
                let mut all = Vec::with_capacity(tools.len() + 1);
                all.push(base);
                all.extend(tools);
                self.union_tree(&all)?
            }
            BooleanType::Subtract | BooleanType::Intersect => {
                let tool = self.union_tree(&tools)?;
                self.boolean_csg(&base, &tool, op)?
            }
        };
        Ok(Arc::new(result))
    }

    fn compound(&self, shapes: &[NativeRef]) -> CadResult<NativeRef> {
        let children = shapes
            .iter()
            .map(|s| self.downcast(s.as_ref()).cloned())
            .collect::<CadResult<Vec<_>>>()?;
        Ok(self.wrap(CsgNode::Compound(children)))
    }
}

//! CSG tree nodes and point membership
//!
//! Every node lives in its own local frame. Solid primitives are centered on
//! the origin; planar regions lie in the local XY plane. Membership uses
//! signed distances (negative inside) so that a negative tolerance selects
//! the strict interior, which is what subtraction needs.

use std::f64::consts::{PI, TAU};

use glam::{DVec2, DVec3};

use super::CsgShape;
use crate::geom::BoundingBox;
use crate::kernel::{BooleanType, ShapeKind};

/// A planar region in local XY coordinates
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Region2d {
    /// Counter-clockwise simple polygon
    Polygon(Vec<DVec2>),
    /// Disk centered on the origin
    Disk { radius: f64 },
}

impl Region2d {
    /// Signed distance to the region boundary, negative inside
    pub fn signed_distance(&self, p: DVec2) -> f64 {
        match self {
            Region2d::Disk { radius } => p.length() - radius,
            Region2d::Polygon(points) => sdf_polygon(points, p),
        }
    }

    pub fn area(&self) -> f64 {
        match self {
            Region2d::Disk { radius } => PI * radius * radius,
            Region2d::Polygon(points) => signed_area(points).abs(),
        }
    }

    pub fn centroid(&self) -> DVec2 {
        match self {
            Region2d::Disk { .. } => DVec2::ZERO,
            Region2d::Polygon(points) => polygon_centroid(points),
        }
    }

    pub fn bounds(&self) -> (DVec2, DVec2) {
        match self {
            Region2d::Disk { radius } => (DVec2::splat(-radius), DVec2::splat(*radius)),
            Region2d::Polygon(points) => points.iter().fold(
                (DVec2::INFINITY, DVec2::NEG_INFINITY),
                |(lo, hi), p| (lo.min(*p), hi.max(*p)),
            ),
        }
    }

    pub fn perimeter(&self) -> f64 {
        match self {
            Region2d::Disk { radius } => TAU * radius,
            Region2d::Polygon(points) => polygon_edges(points)
                .map(|(a, b)| a.distance(b))
                .sum(),
        }
    }

    /// The region mirrored across the local X axis, kept counter-clockwise
    pub fn mirrored_y(&self) -> Region2d {
        match self {
            Region2d::Disk { radius } => Region2d::Disk { radius: *radius },
            Region2d::Polygon(points) => {
                Region2d::Polygon(points.iter().rev().map(|p| DVec2::new(p.x, -p.y)).collect())
            }
        }
    }
}

/// Consecutive edges of a closed polygon
pub(crate) fn polygon_edges(points: &[DVec2]) -> impl Iterator<Item = (DVec2, DVec2)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}

/// Shoelace area, positive for counter-clockwise polygons
pub(crate) fn signed_area(points: &[DVec2]) -> f64 {
    0.5 * polygon_edges(points).map(|(a, b)| a.perp_dot(b)).sum::<f64>()
}

fn polygon_centroid(points: &[DVec2]) -> DVec2 {
    let area = signed_area(points);
    if area.abs() <= f64::EPSILON {
        let sum: DVec2 = points.iter().copied().sum();
        return sum / points.len().max(1) as f64;
    }
    let acc: DVec2 = polygon_edges(points)
        .map(|(a, b)| (a + b) * a.perp_dot(b))
        .sum();
    acc / (6.0 * area)
}

/// Exact signed distance to a simple polygon
fn sdf_polygon(points: &[DVec2], p: DVec2) -> f64 {
    let Some(first) = points.first() else {
        return f64::INFINITY;
    };
    let mut d = (p - *first).length_squared();
    let mut sign = 1.0;
    for (a, b) in polygon_edges(points) {
        let e = b - a;
        let w = p - a;
        let t = (w.dot(e) / e.length_squared()).clamp(0.0, 1.0);
        d = d.min((w - e * t).length_squared());

        // Crossing number test
        let c1 = p.y >= a.y;
        let c2 = p.y < b.y;
        let c3 = e.x * w.y > e.y * w.x;
        if (c1 && c2 && c3) || (!c1 && !c2 && !c3) {
            sign = -sign;
        }
    }
    sign * d.sqrt()
}

fn sdf_box(p: DVec3, half_extents: DVec3) -> f64 {
    let q = p.abs() - half_extents;
    q.max(DVec3::ZERO).length() + q.x.max(q.y.max(q.z)).min(0.0)
}

/// Intersection of a planar region with a slab, as a signed distance
fn sdf_extrusion(in_plane: f64, along_axis: f64) -> f64 {
    let d = DVec2::new(in_plane, along_axis);
    d.x.max(d.y).min(0.0) + d.max(DVec2::ZERO).length()
}

fn distance_to_segment(p: DVec3, start: DVec3, end: DVec3) -> f64 {
    let e = end - start;
    let t = ((p - start).dot(e) / e.length_squared()).clamp(0.0, 1.0);
    p.distance(start + e * t)
}

/// A node of the CSG tree
#[derive(Debug)]
pub(crate) enum CsgNode {
    Vertex(DVec3),
    Segment { start: DVec3, end: DVec3 },
    /// Circle of the given radius in the local XY plane
    Circle { radius: f64 },
    Wire(Vec<CsgShape>),
    Planar(Region2d),
    SphereSurface { radius: f64 },
    /// Lateral surface of a cylinder centered on the origin along Z
    CylinderSurface { radius: f64, height: f64 },
    Cuboid { size: DVec3 },
    Sphere { radius: f64 },
    Cylinder { radius: f64, height: f64 },
    /// A region swept from z = 0 to z = height (height may be negative)
    Prism { profile: Region2d, height: f64 },
    Boolean {
        op: BooleanType,
        a: CsgShape,
        b: CsgShape,
    },
    Compound(Vec<CsgShape>),
}

impl CsgNode {
    pub fn dimension(&self) -> u8 {
        match self {
            CsgNode::Vertex(_) => 0,
            CsgNode::Segment { .. } | CsgNode::Circle { .. } | CsgNode::Wire(_) => 1,
            CsgNode::Planar(_) | CsgNode::SphereSurface { .. } | CsgNode::CylinderSurface { .. } => 2,
            CsgNode::Cuboid { .. }
            | CsgNode::Sphere { .. }
            | CsgNode::Cylinder { .. }
            | CsgNode::Prism { .. } => 3,
            CsgNode::Boolean { a, .. } => a.node().dimension(),
            CsgNode::Compound(children) => children
                .iter()
                .map(|c| c.node().dimension())
                .max()
                .unwrap_or(0),
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            CsgNode::Vertex(_) => ShapeKind::Vertex,
            CsgNode::Segment { .. } | CsgNode::Circle { .. } => ShapeKind::Edge,
            CsgNode::Wire(_) => ShapeKind::Wire,
            CsgNode::Planar(_) | CsgNode::SphereSurface { .. } | CsgNode::CylinderSurface { .. } => {
                ShapeKind::Face
            }
            CsgNode::Cuboid { .. }
            | CsgNode::Sphere { .. }
            | CsgNode::Cylinder { .. }
            | CsgNode::Prism { .. } => ShapeKind::Solid,
            CsgNode::Boolean { .. } => match self.dimension() {
                3 => ShapeKind::Solid,
                _ => ShapeKind::Face,
            },
            CsgNode::Compound(_) => ShapeKind::Compound,
        }
    }

    /// Radius of circular geometry
    pub fn radius(&self) -> Option<f64> {
        match self {
            CsgNode::Circle { radius }
            | CsgNode::Planar(Region2d::Disk { radius })
            | CsgNode::SphereSurface { radius }
            | CsgNode::CylinderSurface { radius, .. }
            | CsgNode::Sphere { radius }
            | CsgNode::Cylinder { radius, .. }
            | CsgNode::Prism {
                profile: Region2d::Disk { radius },
                ..
            } => Some(*radius),
            _ => None,
        }
    }

    /// Point membership in local coordinates.
    ///
    /// A positive tolerance accepts the closed set grown by `tol`; a negative
    /// one accepts only points at least `-tol` inside. Lower dimensional
    /// geometry has no interior and always uses `|tol|`.
    pub fn contains(&self, p: DVec3, tol: f64) -> bool {
        let band = tol.abs();
        match self {
            CsgNode::Vertex(v) => p.distance(*v) <= band,
            CsgNode::Segment { start, end } => distance_to_segment(p, *start, *end) <= band,
            CsgNode::Circle { radius } => {
                p.z.abs() <= band && (p.truncate().length() - radius).abs() <= band
            }
            CsgNode::Wire(edges) => edges.iter().any(|e| e.contains_with(p, tol)),
            CsgNode::Planar(region) => {
                p.z.abs() <= band && region.signed_distance(p.truncate()) <= tol
            }
            CsgNode::SphereSurface { radius } => (p.length() - radius).abs() <= band,
            CsgNode::CylinderSurface { radius, height } => {
                (p.truncate().length() - radius).abs() <= band && p.z.abs() <= height / 2.0 + band
            }
            CsgNode::Cuboid { size } => sdf_box(p, *size / 2.0) <= tol,
            CsgNode::Sphere { radius } => p.length() - radius <= tol,
            CsgNode::Cylinder { radius, height } => {
                sdf_extrusion(p.truncate().length() - radius, p.z.abs() - height / 2.0) <= tol
            }
            CsgNode::Prism { profile, height } => {
                let along = (p.z - height / 2.0).abs() - height.abs() / 2.0;
                sdf_extrusion(profile.signed_distance(p.truncate()), along) <= tol
            }
            CsgNode::Boolean { op, a, b } => match op {
                BooleanType::Union => a.contains_with(p, tol) || b.contains_with(p, tol),
                BooleanType::Intersect => a.contains_with(p, tol) && b.contains_with(p, tol),
                BooleanType::Subtract => a.contains_with(p, tol) && !b.contains_with(p, -tol),
            },
            CsgNode::Compound(children) => children.iter().any(|c| c.contains_with(p, tol)),
        }
    }

    /// Whether a local point lies on the boundary of this node
    pub fn on_boundary(&self, p: DVec3, tol: f64) -> bool {
        self.contains(p, tol) && !self.contains(p, -tol)
    }

    /// Local bounds; boolean and compound nodes use their operands' placed bounds
    pub fn bounds(&self) -> BoundingBox {
        match self {
            CsgNode::Vertex(v) => BoundingBox::from_points([*v]),
            CsgNode::Segment { start, end } => BoundingBox::from_points([*start, *end]),
            CsgNode::Circle { radius } => BoundingBox::new(
                DVec3::new(-radius, -radius, 0.0),
                DVec3::new(*radius, *radius, 0.0),
            ),
            CsgNode::Planar(region) => {
                let (lo, hi) = region.bounds();
                BoundingBox::new(lo.extend(0.0), hi.extend(0.0))
            }
            CsgNode::SphereSurface { radius } | CsgNode::Sphere { radius } => {
                BoundingBox::new(DVec3::splat(-radius), DVec3::splat(*radius))
            }
            CsgNode::CylinderSurface { radius, height } | CsgNode::Cylinder { radius, height } => {
                let half = DVec3::new(*radius, *radius, height / 2.0);
                BoundingBox::new(-half, half)
            }
            CsgNode::Cuboid { size } => BoundingBox::new(-*size / 2.0, *size / 2.0),
            CsgNode::Prism { profile, height } => {
                let (lo, hi) = profile.bounds();
                BoundingBox::new(lo.extend(height.min(0.0)), hi.extend(height.max(0.0)))
            }
            CsgNode::Boolean { op, a, b } => {
                let (ba, bb) = (a.bounding_box_in_parent(), b.bounding_box_in_parent());
                match op {
                    BooleanType::Union => ba.union(&bb),
                    BooleanType::Subtract => ba,
                    BooleanType::Intersect => ba.intersection(&bb),
                }
            }
            CsgNode::Wire(children) | CsgNode::Compound(children) => children
                .iter()
                .fold(BoundingBox::EMPTY, |acc, c| acc.union(&c.bounding_box_in_parent())),
        }
    }

    /// Analytic measure (length, area or volume) and local centroid
    pub fn analytic_mass(&self) -> Option<(f64, DVec3)> {
        match self {
            CsgNode::Vertex(v) => Some((0.0, *v)),
            CsgNode::Segment { start, end } => Some((start.distance(*end), (*start + *end) / 2.0)),
            CsgNode::Circle { radius } => Some((TAU * radius, DVec3::ZERO)),
            CsgNode::Planar(region) => Some((region.area(), region.centroid().extend(0.0))),
            CsgNode::SphereSurface { radius } => Some((4.0 * PI * radius * radius, DVec3::ZERO)),
            CsgNode::CylinderSurface { radius, height } => Some((TAU * radius * height, DVec3::ZERO)),
            CsgNode::Cuboid { size } => Some((size.x * size.y * size.z, DVec3::ZERO)),
            CsgNode::Sphere { radius } => Some((4.0 / 3.0 * PI * radius.powi(3), DVec3::ZERO)),
            CsgNode::Cylinder { radius, height } => Some((PI * radius * radius * height, DVec3::ZERO)),
            CsgNode::Prism { profile, height } => Some((
                profile.area() * height.abs(),
                profile.centroid().extend(height / 2.0),
            )),
            CsgNode::Wire(_) | CsgNode::Boolean { .. } | CsgNode::Compound(_) => None,
        }
    }

    /// Local points used to classify this node against a boolean boundary
    pub fn probe_points(&self) -> Vec<DVec3> {
        match self {
            CsgNode::Vertex(v) => vec![*v],
            CsgNode::Segment { start, end } => vec![(*start + *end) / 2.0],
            CsgNode::Circle { radius } => (0..4)
                .map(|i| {
                    let angle = f64::from(i) * PI / 2.0 + PI / 4.0;
                    DVec3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
                })
                .collect(),
            CsgNode::Planar(Region2d::Disk { radius }) => {
                let mut points = vec![DVec3::ZERO];
                points.extend((0..4).map(|i| {
                    let angle = f64::from(i) * PI / 2.0;
                    DVec3::new(radius * angle.cos(), radius * angle.sin(), 0.0) / 2.0
                }));
                points
            }
            CsgNode::Planar(Region2d::Polygon(points)) => {
                let c = polygon_centroid(points);
                let mut probes = vec![c.extend(0.0)];
                probes.extend(
                    polygon_edges(points).map(|(a, b)| ((a + b) / 2.0).lerp(c, 0.1).extend(0.0)),
                );
                probes
            }
            CsgNode::SphereSurface { radius } => [
                DVec3::X,
                DVec3::NEG_X,
                DVec3::Y,
                DVec3::NEG_Y,
                DVec3::Z,
                DVec3::NEG_Z,
            ]
            .map(|d| d * *radius)
            .to_vec(),
            CsgNode::CylinderSurface { radius, .. } => {
                [DVec3::X, DVec3::NEG_X, DVec3::Y, DVec3::NEG_Y]
                    .map(|d| d * *radius)
                    .to_vec()
            }
            _ => vec![self.bounds().center()],
        }
    }
}

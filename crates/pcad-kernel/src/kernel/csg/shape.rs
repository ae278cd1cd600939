//! Placed CSG shapes
//!
//! A [`CsgShape`] is a shared CSG node plus the location that places it in
//! its parent frame. Moving a shape never copies its tree.

use std::any::Any;
use std::sync::{Arc, OnceLock};

use glam::{DMat3, DVec2, DVec3};

use super::CsgKernelConfig;
use super::node::{CsgNode, Region2d, polygon_edges};
use crate::geom::{BoundingBox, Location, Plane};
use crate::kernel::{BooleanType, GeomType, NativeRef, NativeShape, ShapeKind};

/// Measure (length, area or volume) and centroid in the node's local frame
#[derive(Debug, Clone, Copy)]
struct MassProps {
    measure: f64,
    centroid: DVec3,
}

/// A shape produced by the CSG kernel
#[derive(Debug, Clone)]
pub struct CsgShape {
    node: Arc<CsgNode>,
    location: Location,
    config: CsgKernelConfig,
    mass: Arc<OnceLock<MassProps>>,
}

impl CsgShape {
    pub(crate) fn new(node: CsgNode, config: CsgKernelConfig) -> Self {
        Self {
            node: Arc::new(node),
            location: Location::IDENTITY,
            config,
            mass: Arc::new(OnceLock::new()),
        }
    }

    pub(crate) fn placed(node: CsgNode, location: Location, config: CsgKernelConfig) -> Self {
        Self::new(node, config).with_location(location)
    }

    pub(crate) fn node(&self) -> &CsgNode {
        &self.node
    }

    /// Placement of the node in its parent frame
    pub fn location(&self) -> Location {
        self.location
    }

    /// The same shape moved by `location` (applied after the current placement)
    pub(crate) fn located(&self, location: &Location) -> Self {
        self.with_location(*location * self.location)
    }

    fn with_location(&self, location: Location) -> Self {
        Self {
            node: Arc::clone(&self.node),
            location,
            config: self.config,
            mass: Arc::clone(&self.mass),
        }
    }

    /// Membership of a point given in the parent frame
    pub(crate) fn contains_with(&self, point: DVec3, tol: f64) -> bool {
        let local = self.location.inverse().transform_point(point);
        self.node.contains(local, tol)
    }

    pub(crate) fn bounding_box_in_parent(&self) -> BoundingBox {
        match self.node() {
            CsgNode::Sphere { radius } | CsgNode::SphereSurface { radius } => {
                let center = self.location.position();
                BoundingBox::new(center - *radius, center + *radius)
            }
            node => node.bounds().transformed(&self.location),
        }
    }

    fn mass_props(&self) -> MassProps {
        *self.mass.get_or_init(|| self.compute_mass())
    }

    /// Mass properties with the centroid expressed in the parent frame
    fn mass_in_parent(&self) -> MassProps {
        let props = self.mass_props();
        MassProps {
            measure: props.measure,
            centroid: self.location.transform_point(props.centroid),
        }
    }

    fn compute_mass(&self) -> MassProps {
        if let Some((measure, centroid)) = self.node.analytic_mass() {
            return MassProps { measure, centroid };
        }
        match self.node() {
            CsgNode::Wire(children) | CsgNode::Compound(children) => {
                let dim = self.node.dimension();
                weighted(
                    children
                        .iter()
                        .filter(|c| c.node().dimension() == dim)
                        .map(CsgShape::mass_in_parent),
                )
                .unwrap_or(MassProps {
                    measure: 0.0,
                    centroid: self.node.bounds().center(),
                })
            }
            CsgNode::Boolean { op, a, b } => {
                let (ba, bb) = (a.bounding_box_in_parent(), b.bounding_box_in_parent());
                if !ba.overlaps(&bb) {
                    let (ma, mb) = (a.mass_in_parent(), b.mass_in_parent());
                    return match op {
                        BooleanType::Union => weighted([ma, mb]).unwrap_or(ma),
                        BooleanType::Subtract => ma,
                        BooleanType::Intersect => MassProps {
                            measure: 0.0,
                            centroid: ba.center(),
                        },
                    };
                }
                if self.node.dimension() == 3 {
                    self.sample_volume()
                } else {
                    self.sample_area(a)
                }
            }
            _ => MassProps {
                measure: 0.0,
                centroid: self.node.bounds().center(),
            },
        }
    }

    /// Midpoint-rule volume over the node's bounds
    fn sample_volume(&self) -> MassProps {
        let bounds = self.node.bounds();
        let empty = MassProps {
            measure: 0.0,
            centroid: bounds.center(),
        };
        if bounds.is_empty() {
            return empty;
        }
        let n = self.config.resolution.max(4);
        let step = bounds.size() / n as f64;
        let cell = step.x * step.y * step.z;
        if cell <= 0.0 {
            return empty;
        }

        let mut count = 0usize;
        let mut sum = DVec3::ZERO;
        for i in 0..n {
            for j in 0..n {
                for k in 0..n {
                    let p = bounds.min
                        + step * DVec3::new(i as f64 + 0.5, j as f64 + 0.5, k as f64 + 0.5);
                    if self.node.contains(p, self.config.tolerance) {
                        count += 1;
                        sum += p;
                    }
                }
            }
        }
        if count == 0 {
            return empty;
        }
        MassProps {
            measure: count as f64 * cell,
            centroid: sum / count as f64,
        }
    }

    /// Midpoint-rule area over the node's bounds, in the plane of `reference`
    fn sample_area(&self, reference: &CsgShape) -> MassProps {
        let bounds = self.node.bounds();
        let empty = MassProps {
            measure: 0.0,
            centroid: bounds.center(),
        };
        let Some(plane) = reference.plane() else {
            return empty;
        };
        if bounds.is_empty() {
            return empty;
        }
        let (lo, hi) = bounds
            .corners()
            .iter()
            .map(|c| plane.to_local_2d(*c))
            .fold((DVec2::INFINITY, DVec2::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p), hi.max(p))
            });
        let n = self.config.resolution.max(4);
        let step = (hi - lo) / n as f64;
        let cell = step.x * step.y;
        if cell <= 0.0 {
            return empty;
        }

        let mut count = 0usize;
        let mut sum = DVec3::ZERO;
        for i in 0..n {
            for j in 0..n {
                let uv = lo + step * DVec2::new(i as f64 + 0.5, j as f64 + 0.5);
                let p = plane.from_local_2d(uv);
                if self.node.contains(p, self.config.tolerance) {
                    count += 1;
                    sum += p;
                }
            }
        }
        if count == 0 {
            return empty;
        }
        MassProps {
            measure: count as f64 * cell,
            centroid: sum / count as f64,
        }
    }

    fn probe_points(&self) -> Vec<DVec3> {
        self.node
            .probe_points()
            .into_iter()
            .map(|p| self.location.transform_point(p))
            .collect()
    }

    /// Sub-shapes of a kind, placed in this shape's parent frame
    pub(crate) fn sub_shapes_csg(&self, kind: ShapeKind) -> Vec<CsgShape> {
        let local = self.local_sub_shapes(kind);
        let placed = local.iter().map(|s| s.located(&self.location)).collect();
        dedup(placed, self.config.tolerance)
    }

    fn unplaced(&self) -> CsgShape {
        self.with_location(Location::IDENTITY)
    }

    fn local_sub_shapes(&self, kind: ShapeKind) -> Vec<CsgShape> {
        let config = self.config;
        match (self.node(), kind) {
            (CsgNode::Compound(_), ShapeKind::Compound) => vec![self.unplaced()],
            (CsgNode::Compound(children), _) => children
                .iter()
                .flat_map(|c| c.sub_shapes_csg(kind))
                .collect(),
            (CsgNode::Boolean { .. }, _) => self.boolean_sub_shapes(kind),
            (CsgNode::Wire(_), ShapeKind::Wire) => vec![self.unplaced()],
            (CsgNode::Wire(edges), _) => edges.iter().flat_map(|e| e.sub_shapes_csg(kind)).collect(),
            (node, k) if node.kind() == k => vec![self.unplaced()],

            (CsgNode::Segment { start, end }, ShapeKind::Vertex) => {
                vec![vertex(*start, config), vertex(*end, config)]
            }
            (CsgNode::Planar(Region2d::Polygon(points)), ShapeKind::Edge) => polygon_edges(points)
                .map(|(a, b)| segment(a.extend(0.0), b.extend(0.0), config))
                .collect(),
            (CsgNode::Planar(Region2d::Polygon(points)), ShapeKind::Vertex) => points
                .iter()
                .map(|p| vertex(p.extend(0.0), config))
                .collect(),
            (CsgNode::Planar(Region2d::Disk { radius }), ShapeKind::Edge) => {
                vec![CsgShape::new(CsgNode::Circle { radius: *radius }, config)]
            }
            (CsgNode::CylinderSurface { radius, height }, ShapeKind::Edge) => {
                circle_caps(*radius, -height / 2.0, height / 2.0, config)
            }

            (CsgNode::Cuboid { size }, ShapeKind::Face) => cuboid_faces(*size, config),
            (CsgNode::Cuboid { size }, ShapeKind::Edge) => cuboid_edges(*size, config),
            (CsgNode::Cuboid { size }, ShapeKind::Vertex) => {
                BoundingBox::new(-*size / 2.0, *size / 2.0)
                    .corners()
                    .iter()
                    .map(|c| vertex(*c, config))
                    .collect()
            }

            (CsgNode::Sphere { radius }, ShapeKind::Face) => {
                vec![CsgShape::new(CsgNode::SphereSurface { radius: *radius }, config)]
            }

            (CsgNode::Cylinder { radius, height }, ShapeKind::Face) => {
                let mut faces = disk_caps(*radius, -height / 2.0, height / 2.0, config);
                faces.push(CsgShape::new(
                    CsgNode::CylinderSurface {
                        radius: *radius,
                        height: *height,
                    },
                    config,
                ));
                faces
            }
            (CsgNode::Cylinder { radius, height }, ShapeKind::Edge) => {
                circle_caps(*radius, -height / 2.0, height / 2.0, config)
            }

            (CsgNode::Prism { profile, height }, ShapeKind::Face) => {
                prism_faces(profile, *height, config)
            }
            (CsgNode::Prism { profile, height }, ShapeKind::Edge) => {
                prism_edges(profile, *height, config)
            }
            (
                CsgNode::Prism {
                    profile: Region2d::Polygon(points),
                    height,
                },
                ShapeKind::Vertex,
            ) => points
                .iter()
                .flat_map(|p| [p.extend(0.0), p.extend(*height)])
                .map(|p| vertex(p, config))
                .collect(),

            _ => Vec::new(),
        }
    }

    /// Approximate topology of a boolean result: operand entities that touch
    /// the result boundary
    fn boolean_sub_shapes(&self, kind: ShapeKind) -> Vec<CsgShape> {
        let CsgNode::Boolean { op, a, b } = self.node() else {
            return Vec::new();
        };
        let dim = self.node.dimension();
        let tol = self.config.tolerance;
        let on_boundary = |s: &CsgShape| {
            s.probe_points()
                .into_iter()
                .any(|p| self.node.on_boundary(p, tol))
        };

        match (dim, kind) {
            (3, ShapeKind::Solid) => {
                if *op == BooleanType::Union
                    && !a
                        .bounding_box_in_parent()
                        .overlaps(&b.bounding_box_in_parent())
                {
                    let mut solids = a.sub_shapes_csg(ShapeKind::Solid);
                    solids.extend(b.sub_shapes_csg(ShapeKind::Solid));
                    solids
                } else {
                    vec![self.unplaced()]
                }
            }
            (3, ShapeKind::Face) | (2, ShapeKind::Edge) => {
                let child = if dim == 3 {
                    ShapeKind::Face
                } else {
                    ShapeKind::Edge
                };
                a.sub_shapes_csg(child)
                    .into_iter()
                    .chain(b.sub_shapes_csg(child))
                    .filter(|s| on_boundary(s))
                    .collect()
            }
            (2, ShapeKind::Face) => vec![self.unplaced()],
            (3, ShapeKind::Edge) => self
                .boolean_sub_shapes(ShapeKind::Face)
                .iter()
                .flat_map(|f| f.sub_shapes_csg(ShapeKind::Edge))
                .collect(),
            (_, ShapeKind::Vertex) => self
                .boolean_sub_shapes(ShapeKind::Edge)
                .iter()
                .flat_map(|e| e.sub_shapes_csg(ShapeKind::Vertex))
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn weighted(parts: impl IntoIterator<Item = MassProps>) -> Option<MassProps> {
    let parts: Vec<MassProps> = parts.into_iter().collect();
    let first = *parts.first()?;
    let total: f64 = parts.iter().map(|p| p.measure).sum();
    if total <= 0.0 {
        let sum: DVec3 = parts.iter().map(|p| p.centroid).sum();
        return Some(MassProps {
            measure: 0.0,
            centroid: if parts.len() > 1 {
                sum / parts.len() as f64
            } else {
                first.centroid
            },
        });
    }
    let centroid = parts
        .iter()
        .map(|p| p.centroid * p.measure)
        .sum::<DVec3>()
        / total;
    Some(MassProps {
        measure: total,
        centroid,
    })
}

/// Drop geometric duplicates (shared edges and vertices of adjacent faces)
fn dedup(shapes: Vec<CsgShape>, tolerance: f64) -> Vec<CsgShape> {
    let tol = (tolerance * 1e3).max(1e-9);
    let mut kept: Vec<(CsgShape, BoundingBox, DVec3)> = Vec::with_capacity(shapes.len());
    for shape in shapes {
        let bb = shape.bounding_box();
        let center = shape.center();
        let duplicate = kept.iter().any(|(k, kbb, kc)| {
            k.kind() == shape.kind()
                && kbb.min.abs_diff_eq(bb.min, tol)
                && kbb.max.abs_diff_eq(bb.max, tol)
                && kc.abs_diff_eq(center, tol)
        });
        if !duplicate {
            kept.push((shape, bb, center));
        }
    }
    kept.into_iter().map(|(s, _, _)| s).collect()
}

fn vertex(point: DVec3, config: CsgKernelConfig) -> CsgShape {
    CsgShape::new(CsgNode::Vertex(point), config)
}

fn segment(start: DVec3, end: DVec3, config: CsgKernelConfig) -> CsgShape {
    CsgShape::new(CsgNode::Segment { start, end }, config)
}

/// A frame at `origin` with the given x direction and normal
fn frame(origin: DVec3, x_dir: DVec3, z_dir: DVec3) -> Location {
    Location::from_frame(origin, DMat3::from_cols(x_dir, z_dir.cross(x_dir), z_dir))
}

fn rectangle(width: f64, height: f64) -> Region2d {
    let (w, h) = (width / 2.0, height / 2.0);
    Region2d::Polygon(vec![
        DVec2::new(-w, -h),
        DVec2::new(w, -h),
        DVec2::new(w, h),
        DVec2::new(-w, h),
    ])
}

fn cuboid_faces(size: DVec3, config: CsgKernelConfig) -> Vec<CsgShape> {
    let axes = [DVec3::X, DVec3::Y, DVec3::Z];
    let mut faces = Vec::with_capacity(6);
    for i in 0..3 {
        let (u, v) = ((i + 1) % 3, (i + 2) % 3);
        for sign in [-1.0, 1.0] {
            let normal = axes[i] * sign;
            let origin = normal * size[i] / 2.0;
            faces.push(CsgShape::placed(
                CsgNode::Planar(rectangle(size[u], size[v])),
                frame(origin, axes[u], normal),
                config,
            ));
        }
    }
    faces
}

fn cuboid_edges(size: DVec3, config: CsgKernelConfig) -> Vec<CsgShape> {
    let half = size / 2.0;
    let axes = [DVec3::X, DVec3::Y, DVec3::Z];
    let mut edges = Vec::with_capacity(12);
    for i in 0..3 {
        let (u, v) = ((i + 1) % 3, (i + 2) % 3);
        for su in [-1.0, 1.0] {
            for sv in [-1.0, 1.0] {
                let offset = axes[u] * half[u] * su + axes[v] * half[v] * sv;
                edges.push(segment(
                    offset - axes[i] * half[i],
                    offset + axes[i] * half[i],
                    config,
                ));
            }
        }
    }
    edges
}

/// Bottom face facing -Z at `z0` and top face facing +Z at `z1`
fn disk_caps(radius: f64, z0: f64, z1: f64, config: CsgKernelConfig) -> Vec<CsgShape> {
    let (low, high) = (z0.min(z1), z0.max(z1));
    vec![
        CsgShape::placed(
            CsgNode::Planar(Region2d::Disk { radius }),
            frame(DVec3::new(0.0, 0.0, low), DVec3::X, DVec3::NEG_Z),
            config,
        ),
        CsgShape::placed(
            CsgNode::Planar(Region2d::Disk { radius }),
            Location::from_translation((0.0, 0.0, high)),
            config,
        ),
    ]
}

fn circle_caps(radius: f64, z0: f64, z1: f64, config: CsgKernelConfig) -> Vec<CsgShape> {
    [z0, z1]
        .into_iter()
        .map(|z| {
            CsgShape::placed(
                CsgNode::Circle { radius },
                Location::from_translation((0.0, 0.0, z)),
                config,
            )
        })
        .collect()
}

fn prism_faces(profile: &Region2d, height: f64, config: CsgKernelConfig) -> Vec<CsgShape> {
    let (low, high) = (height.min(0.0), height.max(0.0));
    match profile {
        Region2d::Disk { radius } => {
            let mut faces = disk_caps(*radius, low, high, config);
            faces.push(CsgShape::placed(
                CsgNode::CylinderSurface {
                    radius: *radius,
                    height: height.abs(),
                },
                Location::from_translation((0.0, 0.0, height / 2.0)),
                config,
            ));
            faces
        }
        Region2d::Polygon(points) => {
            let mut faces = vec![
                CsgShape::placed(
                    CsgNode::Planar(profile.mirrored_y()),
                    frame(DVec3::new(0.0, 0.0, low), DVec3::X, DVec3::NEG_Z),
                    config,
                ),
                CsgShape::placed(
                    CsgNode::Planar(profile.clone()),
                    Location::from_translation((0.0, 0.0, high)),
                    config,
                ),
            ];
            for (a, b) in polygon_edges(points) {
                let along = (b - a).extend(0.0);
                let Some(x_dir) = along.try_normalize() else {
                    continue;
                };
                let normal = DVec3::new(x_dir.y, -x_dir.x, 0.0);
                let origin = ((a + b) / 2.0).extend((low + high) / 2.0);
                faces.push(CsgShape::placed(
                    CsgNode::Planar(rectangle(along.length(), high - low)),
                    frame(origin, x_dir, normal),
                    config,
                ));
            }
            faces
        }
    }
}

fn prism_edges(profile: &Region2d, height: f64, config: CsgKernelConfig) -> Vec<CsgShape> {
    match profile {
        Region2d::Disk { radius } => circle_caps(*radius, 0.0, height, config),
        Region2d::Polygon(points) => {
            let mut edges = Vec::with_capacity(points.len() * 3);
            for z in [0.0, height] {
                edges.extend(
                    polygon_edges(points).map(|(a, b)| segment(a.extend(z), b.extend(z), config)),
                );
            }
            edges.extend(
                points
                    .iter()
                    .map(|p| segment(p.extend(0.0), p.extend(height), config)),
            );
            edges
        }
    }
}

impl NativeShape for CsgShape {
    fn kind(&self) -> ShapeKind {
        self.node.kind()
    }

    fn dimension(&self) -> u8 {
        self.node.dimension()
    }

    fn geom_type(&self) -> Option<GeomType> {
        match self.node() {
            CsgNode::Segment { .. } => Some(GeomType::Line),
            CsgNode::Circle { .. } => Some(GeomType::Circle),
            CsgNode::Planar(_) => Some(GeomType::Plane),
            CsgNode::SphereSurface { .. } => Some(GeomType::Sphere),
            CsgNode::CylinderSurface { .. } => Some(GeomType::Cylinder),
            CsgNode::Boolean { .. } if self.dimension() == 2 => Some(GeomType::Plane),
            _ => None,
        }
    }

    fn bounding_box(&self) -> BoundingBox {
        self.bounding_box_in_parent()
    }

    fn center(&self) -> DVec3 {
        match self.node() {
            CsgNode::Vertex(v) => self.location.transform_point(*v),
            _ => self.mass_in_parent().centroid,
        }
    }

    fn length(&self) -> Option<f64> {
        (self.dimension() == 1).then(|| self.mass_props().measure)
    }

    fn area(&self) -> Option<f64> {
        (self.dimension() == 2).then(|| self.mass_props().measure)
    }

    fn volume(&self) -> Option<f64> {
        (self.dimension() == 3).then(|| self.mass_props().measure)
    }

    fn radius(&self) -> Option<f64> {
        self.node.radius()
    }

    fn direction(&self) -> Option<DVec3> {
        match self.node() {
            CsgNode::Segment { start, end } => (*end - *start)
                .try_normalize()
                .map(|d| self.location.transform_vector(d)),
            CsgNode::Planar(_) => Some(self.location.transform_vector(DVec3::Z)),
            CsgNode::Boolean { a, .. } if self.dimension() == 2 => {
                a.direction().map(|d| self.location.transform_vector(d))
            }
            _ => None,
        }
    }

    fn plane(&self) -> Option<Plane> {
        match self.node() {
            CsgNode::Planar(_) | CsgNode::Circle { .. } => Some(Plane::from_location(&self.location)),
            CsgNode::Boolean { a, .. } if self.dimension() == 2 => a
                .plane()
                .map(|p| Plane::from_location(&(self.location * p.location()))),
            _ => None,
        }
    }

    fn contains(&self, point: DVec3) -> bool {
        self.contains_with(point, self.config.tolerance)
    }

    fn sub_shapes(&self, kind: ShapeKind) -> Vec<NativeRef> {
        self.sub_shapes_csg(kind)
            .into_iter()
            .map(|s| Arc::new(s) as NativeRef)
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

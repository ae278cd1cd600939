//! Shapes and the kernel handle
//!
//! A [`Shape`] wraps an opaque kernel object together with the kernel that
//! made it, so queries and combinations never need a context argument.

use std::fmt;
use std::sync::Arc;

use glam::{DVec2, DVec3};
use pcad_kernel::{
    BooleanType, BoundingBox, CadKernel, CadResult, CsgKernel, CsgKernelConfig, GeomType,
    Location, NativeRef, Plane, ShapeKind,
};
use uuid::Uuid;

use crate::shape_list::ShapeList;

/// Cloneable handle to a CAD kernel
#[derive(Clone)]
pub struct Kernel {
    inner: Arc<dyn CadKernel>,
}

impl fmt::Debug for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.inner.name())
            .finish()
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::csg()
    }
}

impl Kernel {
    /// Wrap a kernel implementation
    pub fn new(kernel: impl CadKernel + 'static) -> Self {
        Self {
            inner: Arc::new(kernel),
        }
    }

    /// Wrap an already shared kernel
    pub fn from_arc(kernel: Arc<dyn CadKernel>) -> Self {
        Self { inner: kernel }
    }

    /// The reference CSG kernel with default settings
    pub fn csg() -> Self {
        Self::new(CsgKernel::default())
    }

    /// The reference CSG kernel with explicit settings
    pub fn csg_with(config: CsgKernelConfig) -> Self {
        Self::new(CsgKernel::new(config))
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    /// Direct access to the kernel implementation
    pub fn raw(&self) -> &dyn CadKernel {
        self.inner.as_ref()
    }

    fn wrap(&self, native: NativeRef) -> Shape {
        Shape {
            id: Uuid::new_v4(),
            native,
            kernel: self.clone(),
            label: None,
        }
    }

    fn natives(shapes: &[Shape]) -> Vec<NativeRef> {
        shapes.iter().map(|s| Arc::clone(&s.native)).collect()
    }

    pub fn vertex(&self, point: DVec3) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_vertex(point)?))
    }

    pub fn line(&self, start: DVec3, end: DVec3) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_line(start, end)?))
    }

    pub fn wire(&self, edges: &[Shape]) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_wire(&Self::natives(edges))?))
    }

    pub fn circle(&self, radius: f64) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_circle(radius)?))
    }

    pub fn polygon(&self, points: &[DVec2]) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_polygon(points)?))
    }

    pub fn disk(&self, radius: f64) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_disk(radius)?))
    }

    /// Box centered on the origin
    pub fn cuboid(&self, size: DVec3) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_box(size)?))
    }

    pub fn sphere(&self, radius: f64) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_sphere(radius)?))
    }

    /// Cylinder along Z centered on the origin
    pub fn cylinder(&self, radius: f64, height: f64) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_cylinder(radius, height)?))
    }

    /// Planar face bounded by a closed chain of edges
    pub fn make_face(&self, edges: &[Shape]) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.make_face(&Self::natives(edges))?))
    }

    pub fn extrude(&self, face: &Shape, direction: DVec3) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.extrude(face.native.as_ref(), direction)?))
    }

    pub fn transform(&self, shape: &Shape, location: &Location) -> CadResult<Shape> {
        let mut moved = self.wrap(self.inner.transform(shape.native.as_ref(), location)?);
        moved.label = shape.label.clone();
        Ok(moved)
    }

    pub fn boolean(&self, a: &Shape, b: &Shape, op: BooleanType) -> CadResult<Shape> {
        Ok(self.wrap(
            self.inner
                .boolean(a.native.as_ref(), b.native.as_ref(), op)?,
        ))
    }

    /// Combine a base with several tools in one kernel call
    pub fn boolean_many(&self, base: &Shape, tools: &[Shape], op: BooleanType) -> CadResult<Shape> {
        Ok(self.wrap(
            self.inner
                .boolean_many(&base.native, &Self::natives(tools), op)?,
        ))
    }

    pub fn compound(&self, shapes: &[Shape]) -> CadResult<Shape> {
        Ok(self.wrap(self.inner.compound(&Self::natives(shapes))?))
    }
}

/// A topological entity produced by a kernel
#[derive(Clone)]
pub struct Shape {
    id: Uuid,
    native: NativeRef,
    kernel: Kernel,
    label: Option<String>,
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("label", &self.label)
            .finish()
    }
}

impl Shape {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// The same shape with a label attached
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The kernel that created this shape
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// The kernel-native object
    pub fn native(&self) -> &NativeRef {
        &self.native
    }

    pub fn kind(&self) -> ShapeKind {
        self.native.kind()
    }

    /// Topological dimension (0 vertex, 1 curve, 2 surface, 3 solid)
    pub fn dimension(&self) -> u8 {
        self.native.dimension()
    }

    pub fn geom_type(&self) -> Option<GeomType> {
        self.native.geom_type()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.native.bounding_box()
    }

    pub fn center(&self) -> DVec3 {
        self.native.center()
    }

    pub fn length(&self) -> Option<f64> {
        self.native.length()
    }

    pub fn area(&self) -> Option<f64> {
        self.native.area()
    }

    pub fn volume(&self) -> Option<f64> {
        self.native.volume()
    }

    pub fn radius(&self) -> Option<f64> {
        self.native.radius()
    }

    /// Direction of a straight edge or normal of a planar face
    pub fn direction(&self) -> Option<DVec3> {
        self.native.direction()
    }

    pub fn plane(&self) -> Option<Plane> {
        self.native.plane()
    }

    pub fn contains(&self, point: DVec3) -> bool {
        self.native.contains(point)
    }

    /// A copy moved by a location (applied after the current placement)
    pub fn moved(&self, location: &Location) -> CadResult<Shape> {
        self.kernel.transform(self, location)
    }

    /// A copy placed so that its local XY frame coincides with `plane`
    pub fn located_on(&self, plane: &Plane) -> CadResult<Shape> {
        self.moved(&plane.location())
    }

    pub(crate) fn sub_shapes(&self, kind: ShapeKind) -> ShapeList {
        self.native
            .sub_shapes(kind)
            .into_iter()
            .map(|native| self.kernel.wrap(native))
            .collect()
    }

    pub fn vertices(&self) -> ShapeList {
        self.sub_shapes(ShapeKind::Vertex)
    }

    pub fn edges(&self) -> ShapeList {
        self.sub_shapes(ShapeKind::Edge)
    }

    pub fn wires(&self) -> ShapeList {
        self.sub_shapes(ShapeKind::Wire)
    }

    pub fn faces(&self) -> ShapeList {
        self.sub_shapes(ShapeKind::Face)
    }

    pub fn solids(&self) -> ShapeList {
        self.sub_shapes(ShapeKind::Solid)
    }
}

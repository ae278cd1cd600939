//! CAD kernel trait definitions
//!
//! These traits define the interface the build layer uses to talk to a
//! geometry kernel. The build layer never inspects kernel internals; it only
//! forwards constructors, booleans and queries through [`CadKernel`] and
//! [`NativeShape`].

mod csg;

pub use csg::{CsgKernel, CsgKernelConfig, CsgShape};

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use glam::{DVec2, DVec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geom::{BoundingBox, Location, Plane};

/// Topological kind of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Vertex,
    Edge,
    Wire,
    Face,
    Shell,
    Solid,
    Compound,
}

impl ShapeKind {
    /// Topological dimension of this kind (compounds report `None`)
    pub fn dimension(self) -> Option<u8> {
        match self {
            ShapeKind::Vertex => Some(0),
            ShapeKind::Edge | ShapeKind::Wire => Some(1),
            ShapeKind::Face | ShapeKind::Shell => Some(2),
            ShapeKind::Solid => Some(3),
            ShapeKind::Compound => None,
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Vertex => "vertex",
            ShapeKind::Edge => "edge",
            ShapeKind::Wire => "wire",
            ShapeKind::Face => "face",
            ShapeKind::Shell => "shell",
            ShapeKind::Solid => "solid",
            ShapeKind::Compound => "compound",
        };
        f.write_str(name)
    }
}

/// Underlying geometry of an edge or face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeomType {
    /// Straight edge
    Line,
    /// Circular edge
    Circle,
    /// Planar face
    Plane,
    /// Cylindrical face
    Cylinder,
    /// Spherical face
    Sphere,
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanType {
    /// Union (fuse)
    Union,
    /// Subtraction (cut)
    Subtract,
    /// Intersection (common)
    Intersect,
}

impl fmt::Display for BooleanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BooleanType::Union => "union",
            BooleanType::Subtract => "subtract",
            BooleanType::Intersect => "intersect",
        };
        f.write_str(name)
    }
}

/// Error type for CAD kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Boolean operation failed: {0}")]
    BooleanFailed(String),

    #[error("Kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Shape was not created by the {0} kernel")]
    ForeignShape(String),

    #[error("{op} is not supported for a {kind}")]
    UnsupportedShape { op: &'static str, kind: ShapeKind },
}

/// Result type for CAD operations
pub type CadResult<T> = Result<T, CadError>;

/// Shared handle to a kernel-native shape
pub type NativeRef = Arc<dyn NativeShape>;

/// An opaque kernel object
///
/// All queries are answered in global coordinates. Measures that make no
/// sense for a shape (the radius of a box, the length of a face) are `None`.
pub trait NativeShape: Send + Sync + fmt::Debug {
    /// Topological kind
    fn kind(&self) -> ShapeKind;

    /// Topological dimension (0 vertex, 1 curve, 2 surface, 3 solid)
    fn dimension(&self) -> u8;

    /// Underlying geometry for edges and faces
    fn geom_type(&self) -> Option<GeomType>;

    /// Axis-aligned bounds
    fn bounding_box(&self) -> BoundingBox;

    /// Center of mass (or of the bounds when no mass is defined)
    fn center(&self) -> DVec3;

    fn length(&self) -> Option<f64>;

    fn area(&self) -> Option<f64>;

    fn volume(&self) -> Option<f64>;

    fn radius(&self) -> Option<f64>;

    /// Direction of a straight edge or normal of a planar face
    fn direction(&self) -> Option<DVec3>;

    /// Supporting plane of a planar face or circular edge
    fn plane(&self) -> Option<Plane>;

    /// Point membership within the kernel tolerance
    fn contains(&self, point: DVec3) -> bool;

    /// Sub-shapes of the given kind, deduplicated
    fn sub_shapes(&self, kind: ShapeKind) -> Vec<NativeRef>;

    /// Access to the concrete type, for kernels that need to downcast
    fn as_any(&self) -> &dyn Any;
}

/// The main CAD kernel trait
///
/// Implementations provide the actual geometry operations. Planar
/// constructors build in the local XY plane; solid primitives are centered
/// on the origin.
pub trait CadKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Create a vertex
    fn make_vertex(&self, point: DVec3) -> CadResult<NativeRef>;

    /// Create a straight edge between two distinct points
    fn make_line(&self, start: DVec3, end: DVec3) -> CadResult<NativeRef>;

    /// Create a chain of edges
    fn make_wire(&self, edges: &[NativeRef]) -> CadResult<NativeRef>;

    /// Create a circular edge in the XY plane
    fn make_circle(&self, radius: f64) -> CadResult<NativeRef>;

    /// Create a planar polygonal face in the XY plane
    fn make_polygon(&self, points: &[DVec2]) -> CadResult<NativeRef>;

    /// Create a circular face in the XY plane
    fn make_disk(&self, radius: f64) -> CadResult<NativeRef>;

    /// Create a box centered on the origin
    fn make_box(&self, size: DVec3) -> CadResult<NativeRef>;

    /// Create a sphere centered on the origin
    fn make_sphere(&self, radius: f64) -> CadResult<NativeRef>;

    /// Create a cylinder along Z centered on the origin
    fn make_cylinder(&self, radius: f64, height: f64) -> CadResult<NativeRef>;

    /// Build a planar face from a closed chain of edges
    fn make_face(&self, edges: &[NativeRef]) -> CadResult<NativeRef>;

    /// Sweep a planar face along a direction normal to it
    ///
    /// # Arguments
    /// * `face` - The face to extrude
    /// * `direction` - The extrusion vector; its length is the distance
    fn extrude(&self, face: &dyn NativeShape, direction: DVec3) -> CadResult<NativeRef>;

    /// Move a shape by a rigid transform
    fn transform(&self, shape: &dyn NativeShape, location: &Location) -> CadResult<NativeRef>;

    /// Perform a boolean operation on two shapes of the same dimension
    ///
    /// # Arguments
    /// * `a` - The first shape
    /// * `b` - The second shape
    /// * `op` - The boolean operation type
    fn boolean(
        &self,
        a: &dyn NativeShape,
        b: &dyn NativeShape,
        op: BooleanType,
    ) -> CadResult<NativeRef>;

    /// Combine a base shape with several tools in one call
    ///
    /// The tools act as one group: `Subtract` and `Intersect` apply to the
    /// union of all tools. The default folds pairwise; kernels with an
    /// N-ary boolean should override it.
    fn boolean_many(
        &self,
        base: &NativeRef,
        tools: &[NativeRef],
        op: BooleanType,
    ) -> CadResult<NativeRef> {
        let Some((first, rest)) = tools.split_first() else {
            return Ok(base.clone());
        };
        if op == BooleanType::Union {
            let mut acc = base.clone();
            for tool in tools {
                acc = self.boolean(acc.as_ref(), tool.as_ref(), op)?;
            }
            return Ok(acc);
        }
        let mut group = first.clone();
        for tool in rest {
            group = self.boolean(group.as_ref(), tool.as_ref(), BooleanType::Union)?;
        }
        self.boolean(base.as_ref(), group.as_ref(), op)
    }

    /// Group shapes without fusing them
    fn compound(&self, shapes: &[NativeRef]) -> CadResult<NativeRef>;
}

/// A kernel that is never available
///
/// Useful to check that a build fails cleanly when no geometry backend is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>(&self) -> CadResult<T> {
        Err(CadError::KernelNotAvailable(self.name().to_string()))
    }
}

impl CadKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn make_vertex(&self, _point: DVec3) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_line(&self, _start: DVec3, _end: DVec3) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_wire(&self, _edges: &[NativeRef]) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_circle(&self, _radius: f64) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_polygon(&self, _points: &[DVec2]) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_disk(&self, _radius: f64) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_box(&self, _size: DVec3) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_sphere(&self, _radius: f64) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_cylinder(&self, _radius: f64, _height: f64) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn make_face(&self, _edges: &[NativeRef]) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn extrude(&self, _face: &dyn NativeShape, _direction: DVec3) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn transform(&self, _shape: &dyn NativeShape, _location: &Location) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn boolean(
        &self,
        _a: &dyn NativeShape,
        _b: &dyn NativeShape,
        _op: BooleanType,
    ) -> CadResult<NativeRef> {
        self.unavailable()
    }

    fn compound(&self, _shapes: &[NativeRef]) -> CadResult<NativeRef> {
        self.unavailable()
    }
}

/// Get the default CAD kernel
pub fn default_kernel() -> Box<dyn CadKernel> {
    Box::new(CsgKernel::default())
}

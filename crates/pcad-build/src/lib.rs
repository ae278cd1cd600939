//! Parametric Build Layer
//!
//! This crate provides:
//! - Scoped location, workplane and builder stacks with RAII guards
//! - Line, sketch and part builders that route new geometry to the right result
//! - A combination engine for add/subtract/intersect/replace/private modes
//! - Filterable, sortable and groupable shape lists
//! - Operators for combining and placing shapes outside any builder
//! - An arena-based assembly forest

pub mod algebra;
pub mod assembly;
pub mod builder;
pub mod combine;
pub mod config;
pub mod context;
pub mod error;
pub mod mode;
pub mod objects;
pub mod operations;
pub mod shape;
pub mod shape_list;

// Re-exports for convenience
pub use algebra::Subtractive;
pub use assembly::{Assembly, AssemblyNode, NodeId};
pub use builder::{
    BuildLine, BuildPart, BuildSketch, Builder, BuilderId, BuilderKind, BuilderOptions,
    BuilderState,
};
pub use combine::{combine, combine_many};
pub use config::BuildConfig;
pub use context::{
    BuildContext, FrameToken, GridLocations, Locations, PolarLocations, StackKind, Workplanes,
    open_builder_count,
};
pub use error::{AssemblyError, BuildError, BuildResult, ConfigError};
pub use mode::Mode;
pub use objects::{
    Align, BuildObject, Circle, Cuboid, Cylinder, Line, Polygon, Polyline, Rectangle,
    RegularPolygon, Sphere,
};
pub use operations::{extrude, extrude_face, make_face};
pub use shape::{Kernel, Shape};
pub use shape_list::{DEFAULT_GROUP_DIGITS, Select, ShapeGroups, ShapeList, SortBy};

pub use pcad_kernel::{
    Axis, BoundingBox, CadError, GeomError, GeomType, Location, Plane, ShapeKind,
};

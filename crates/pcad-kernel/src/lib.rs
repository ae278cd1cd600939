//! Geometry Algebra and CAD Kernel Abstraction
//!
//! This crate provides:
//! - Rigid transforms (`Location`), local frames (`Plane`), axes and bounding boxes
//! - The `CadKernel` trait the build layer delegates geometry to
//! - A null kernel and a constructive-solid-geometry reference kernel

pub mod constants;
pub mod geom;
pub mod kernel;

// Re-exports for convenience
pub use geom::{Axis, BoundingBox, GeomError, GeomResult, Location, Plane};
pub use kernel::{
    BooleanType, CadError, CadKernel, CadResult, CsgKernel, CsgKernelConfig, CsgShape, GeomType,
    NativeRef, NativeShape, NullKernel, ShapeKind, default_kernel,
};

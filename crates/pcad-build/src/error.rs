//! Error types for the build layer

use pcad_kernel::{CadError, GeomError, ShapeKind};
use thiserror::Error;

use crate::assembly::NodeId;
use crate::builder::{BuilderId, BuilderKind};
use crate::context::{FrameToken, StackKind};
use crate::mode::Mode;
use crate::shape_list::SortBy;

/// Build-related errors
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    #[error("{operation} requires an enclosing {required} builder (open builders: [{active}])")]
    NoBuilder {
        operation: &'static str,
        required: BuilderKind,
        active: String,
    },

    #[error("{stack} scope exited out of order: top frame is {expected}, tried to exit {found}")]
    OutOfOrderExit {
        stack: StackKind,
        expected: FrameToken,
        found: FrameToken,
    },

    #[error("{0} stack is empty")]
    StackUnderflow(StackKind),

    #[error("{0} scope needs at least one value")]
    EmptyFrame(StackKind),

    #[error("{0} builder is closed")]
    BuilderClosed(BuilderKind),

    #[error("Builder {0} does not belong to this context")]
    UnknownBuilder(BuilderId),

    #[error("{mode} needs an existing result to combine with, but there is none")]
    EmptyBase { mode: Mode },

    #[error("{mode} is not supported for {context}")]
    ModeNotSupported { context: String, mode: Mode },

    #[error("{target} expects {expected} geometry, got a {found}-dimensional shape")]
    DimensionMismatch {
        target: String,
        expected: &'static str,
        found: u8,
    },

    #[error("Key {key} is not defined for a {kind}")]
    KeyMismatch { key: SortBy, kind: ShapeKind },

    #[error("Operator {op} cannot be used inside a builder ({builders} open)")]
    AlgebraInsideBuilder { op: &'static str, builders: usize },

    #[error("{builder} builder has no pending {what}")]
    NothingToConsume {
        builder: BuilderKind,
        what: &'static str,
    },

    #[error("Shape is not a planar face")]
    NonPlanarFace,

    #[error("Geometry error: {0}")]
    Geom(#[from] GeomError),

    #[error("CAD kernel error: {0}")]
    Cad(#[from] CadError),

    #[error("Assembly error: {0}")]
    Assembly(#[from] AssemblyError),
}

/// Result type for build operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Assembly-related errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("Connection would create a cycle at node {0}")]
    WouldCreateCycle(NodeId),
    #[error("Node {0} listed twice as a child")]
    DuplicateChild(NodeId),
}

/// Configuration file errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialize(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

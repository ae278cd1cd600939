//! Location and Plane Algebra
//!
//! Rigid transforms, local coordinate frames, axes and axis-aligned bounds.
//! Every placement in the build layer is expressed with these types.

mod axis;
mod bbox;
mod location;
mod plane;

pub use axis::Axis;
pub use bbox::BoundingBox;
pub use location::Location;
pub use plane::Plane;

use thiserror::Error;

/// Errors raised while constructing geometric values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeomError {
    #[error("Plane {axis} direction is not unit length (length {length})")]
    NonUnitAxis { axis: &'static str, length: f64 },

    #[error("Plane axes are not perpendicular (x·z = {dot})")]
    NonOrthogonalAxes { dot: f64 },

    #[error("Degenerate location: {0}")]
    DegenerateLocation(String),

    #[error("Axis direction has zero length")]
    ZeroDirection,

    #[error("Non-finite coordinate in {0}")]
    NonFinite(&'static str),
}

/// Result type for geometric constructors
pub type GeomResult<T> = Result<T, GeomError>;

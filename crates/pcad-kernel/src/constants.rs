//! Global constants for pcad-kernel

/// Linear tolerance for geometric comparisons
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Tolerance used when validating unit vectors and orthogonality of frames
pub const AXIS_TOLERANCE: f64 = 1e-9;

/// Samples per axis used when measuring boolean results
pub const DEFAULT_SAMPLE_RESOLUTION: usize = 48;

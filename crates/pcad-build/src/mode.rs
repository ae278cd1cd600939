//! Combination modes

use std::fmt;

use pcad_kernel::BooleanType;
use serde::{Deserialize, Serialize};

/// How a new shape is combined with a builder's accumulated result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// Fuse with the existing result
    #[default]
    Add,
    /// Cut from the existing result
    Subtract,
    /// Keep only the common part
    Intersect,
    /// Discard the existing result
    Replace,
    /// Return to the caller only; the result is untouched
    Private,
}

impl Mode {
    /// Modes that need an existing result to operate on
    pub fn needs_base(self) -> bool {
        matches!(self, Mode::Subtract | Mode::Intersect)
    }
}

impl From<Mode> for Option<BooleanType> {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Add => Some(BooleanType::Union),
            Mode::Subtract => Some(BooleanType::Subtract),
            Mode::Intersect => Some(BooleanType::Intersect),
            Mode::Replace | Mode::Private => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Add => "ADD",
            Mode::Subtract => "SUBTRACT",
            Mode::Intersect => "INTERSECT",
            Mode::Replace => "REPLACE",
            Mode::Private => "PRIVATE",
        };
        f.write_str(name)
    }
}

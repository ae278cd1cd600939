//! Shape selection lists
//!
//! Every query returns a new list; the receiver is never modified. Sorting is
//! stable and groups are ordered by ascending key.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

use pcad_kernel::{Axis, GeomType};

use crate::error::{BuildError, BuildResult};
use crate::shape::Shape;

/// Decimal places kept when grouping by a key
pub const DEFAULT_GROUP_DIGITS: u32 = 6;

/// Tolerance used when testing whether a direction lies along an axis
const AXIS_PARALLEL_TOLERANCE: f64 = 1e-6;

/// Numeric key for sorting and grouping
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortBy {
    Length,
    Radius,
    Area,
    Volume,
    /// Distance of the center from the origin
    Distance,
    /// Position of the center along an axis
    Axis(Axis),
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortBy::Length => f.write_str("LENGTH"),
            SortBy::Radius => f.write_str("RADIUS"),
            SortBy::Area => f.write_str("AREA"),
            SortBy::Volume => f.write_str("VOLUME"),
            SortBy::Distance => f.write_str("DISTANCE"),
            SortBy::Axis(axis) => write!(f, "AXIS{}", axis.direction()),
        }
    }
}

impl SortBy {
    /// Evaluate the key, failing when it means nothing for this shape
    pub fn key(&self, shape: &Shape) -> BuildResult<f64> {
        let value = match self {
            SortBy::Length => shape.length(),
            SortBy::Radius => shape.radius(),
            SortBy::Area => shape.area(),
            SortBy::Volume => shape.volume(),
            SortBy::Distance => Some(shape.center().length()),
            SortBy::Axis(axis) => Some(axis.project(shape.center())),
        };
        value.ok_or(BuildError::KeyMismatch {
            key: *self,
            kind: shape.kind(),
        })
    }
}

/// Which entities a builder query should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Select {
    /// Everything in the accumulated result
    #[default]
    All,
    /// Only what the most recent contribution produced
    Last,
}

/// Resolve a possibly negative index against a length
fn resolve_index(index: isize, len: usize) -> Option<usize> {
    if index < 0 {
        len.checked_sub(index.unsigned_abs())
    } else {
        let index = index as usize;
        (index < len).then_some(index)
    }
}

/// Clamp a possibly negative slice bound into `0..=len`
fn clamp_bound(bound: isize, len: usize) -> usize {
    if bound < 0 {
        len.saturating_sub(bound.unsigned_abs())
    } else {
        (bound as usize).min(len)
    }
}

/// An ordered collection of shapes
#[derive(Debug, Clone, Default)]
pub struct ShapeList {
    shapes: Vec<Shape>,
}

impl ShapeList {
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    pub fn into_vec(self) -> Vec<Shape> {
        self.shapes
    }

    /// Shapes with the given underlying geometry
    pub fn filter_by(&self, geom_type: GeomType) -> ShapeList {
        self.filter_where(|s| s.geom_type() == Some(geom_type))
    }

    /// Straight edges along the axis, or planar faces whose normal is along it
    pub fn filter_by_axis(&self, axis: &Axis) -> ShapeList {
        self.filter_where(|s| {
            s.direction()
                .is_some_and(|d| axis.is_parallel(d, AXIS_PARALLEL_TOLERANCE))
        })
    }

    /// Shapes for which the predicate holds, in their original order
    pub fn filter_where(&self, predicate: impl Fn(&Shape) -> bool) -> ShapeList {
        self.shapes.iter().filter(|s| predicate(s)).cloned().collect()
    }

    /// Shapes whose center projects onto `axis` within `[min, max]`
    ///
    /// # Arguments
    /// * `inclusive` - Whether the `(min, max)` bounds are included
    pub fn filter_by_position(
        &self,
        axis: &Axis,
        min: f64,
        max: f64,
        inclusive: (bool, bool),
    ) -> ShapeList {
        self.filter_where(|s| {
            let t = axis.project(s.center());
            let above = if inclusive.0 { t >= min } else { t > min };
            let below = if inclusive.1 { t <= max } else { t < max };
            above && below
        })
    }

    /// A stable ascending sort by a key
    pub fn sort_by(&self, key: SortBy) -> BuildResult<ShapeList> {
        let mut keyed = self
            .shapes
            .iter()
            .map(|s| Ok((key.key(s)?, s.clone())))
            .collect::<BuildResult<Vec<_>>>()?;
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(keyed.into_iter().map(|(_, s)| s).collect())
    }

    /// Partition by a key rounded to [`DEFAULT_GROUP_DIGITS`] decimal places
    pub fn group_by(&self, key: SortBy) -> BuildResult<ShapeGroups> {
        self.group_by_with(key, DEFAULT_GROUP_DIGITS)
    }

    /// Partition by a key rounded to `digits` decimal places
    pub fn group_by_with(&self, key: SortBy, digits: u32) -> BuildResult<ShapeGroups> {
        let scale = 10f64.powi(digits.min(15) as i32);
        let mut groups: BTreeMap<i64, Vec<Shape>> = BTreeMap::new();
        for shape in &self.shapes {
            let value = key.key(shape)?;
            groups
                .entry((value * scale).round() as i64)
                .or_default()
                .push(shape.clone());
        }
        Ok(ShapeGroups {
            groups: groups
                .into_iter()
                .map(|(k, shapes)| (k as f64 / scale, ShapeList::new(shapes)))
                .collect(),
        })
    }

    /// Element at an index; negative indices count from the end
    pub fn get(&self, index: isize) -> Option<&Shape> {
        resolve_index(index, self.shapes.len()).map(|i| &self.shapes[i])
    }

    /// Elements in `start..end`; negative bounds count from the end
    pub fn slice(&self, start: isize, end: isize) -> ShapeList {
        let len = self.shapes.len();
        let (start, end) = (clamp_bound(start, len), clamp_bound(end, len));
        if start >= end {
            return ShapeList::default();
        }
        ShapeList::new(self.shapes[start..end].to_vec())
    }
}

impl Deref for ShapeList {
    type Target = [Shape];

    fn deref(&self) -> &[Shape] {
        &self.shapes
    }
}

impl From<Vec<Shape>> for ShapeList {
    fn from(shapes: Vec<Shape>) -> Self {
        Self::new(shapes)
    }
}

impl FromIterator<Shape> for ShapeList {
    fn from_iter<I: IntoIterator<Item = Shape>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for ShapeList {
    type Item = Shape;
    type IntoIter = std::vec::IntoIter<Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.into_iter()
    }
}

impl<'a> IntoIterator for &'a ShapeList {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}

/// Groups of shapes sharing a key value, ordered by ascending key
#[derive(Debug, Clone, Default)]
pub struct ShapeGroups {
    groups: Vec<(f64, ShapeList)>,
}

impl ShapeGroups {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Group at an index; `-1` is the highest key
    pub fn get(&self, index: isize) -> Option<&ShapeList> {
        resolve_index(index, self.groups.len()).map(|i| &self.groups[i].1)
    }

    pub fn first(&self) -> Option<&ShapeList> {
        self.get(0)
    }

    pub fn last(&self) -> Option<&ShapeList> {
        self.get(-1)
    }

    /// The rounded key of each group
    pub fn keys(&self) -> Vec<f64> {
        self.groups.iter().map(|(k, _)| *k).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapeList> {
        self.groups.iter().map(|(_, g)| g)
    }
}

//! Combination engine
//!
//! One pure entry point shared by the builders and the operator layer.
//! Curves are collected into compounds; surfaces and solids go through the
//! kernel's boolean operations, batched into a single call per combine.

use pcad_kernel::BooleanType;

use crate::error::{BuildError, BuildResult};
use crate::mode::Mode;
use crate::shape::{Kernel, Shape};

/// Combine one incoming shape with an existing result
pub fn combine(
    kernel: &Kernel,
    existing: Option<&Shape>,
    incoming: &Shape,
    mode: Mode,
) -> BuildResult<Option<Shape>> {
    combine_many(kernel, existing, std::slice::from_ref(incoming), mode)
}

/// Combine several incoming shapes with an existing result in one operation
///
/// Returns `None` only when there was nothing to begin with and nothing was
/// added. `Subtract` and `Intersect` fail on an empty base.
pub fn combine_many(
    kernel: &Kernel,
    existing: Option<&Shape>,
    incoming: &[Shape],
    mode: Mode,
) -> BuildResult<Option<Shape>> {
    let Some((first, rest)) = incoming.split_first() else {
        return Ok(existing.cloned());
    };
    if mode == Mode::Private {
        return Ok(existing.cloned());
    }
    tracing::trace!(
        "combine {} shape(s) into {} with {mode}",
        incoming.len(),
        existing.map_or("nothing".to_string(), |s| s.kind().to_string())
    );

    let curves = incoming.iter().all(|s| s.dimension() < 2)
        && existing.is_none_or(|s| s.dimension() < 2);
    if curves {
        return combine_curves(kernel, existing, incoming, mode).map(Some);
    }

    let result = match (mode, existing) {
        (Mode::Replace, _) | (Mode::Add, None) => fuse(kernel, first, rest)?,
        (Mode::Add, Some(base)) => kernel.boolean_many(base, incoming, BooleanType::Union)?,
        (Mode::Subtract | Mode::Intersect, None) => return Err(BuildError::EmptyBase { mode }),
        (Mode::Subtract, Some(base)) => kernel.boolean_many(base, incoming, BooleanType::Subtract)?,
        (Mode::Intersect, Some(base)) => {
            kernel.boolean_many(base, incoming, BooleanType::Intersect)?
        }
        (Mode::Private, _) => return Ok(existing.cloned()),
    };
    Ok(Some(result))
}

fn fuse(kernel: &Kernel, first: &Shape, rest: &[Shape]) -> BuildResult<Shape> {
    if rest.is_empty() {
        return Ok(first.clone());
    }
    Ok(kernel.boolean_many(first, rest, BooleanType::Union)?)
}

/// Curves have no interior to fuse, so they are gathered into a compound
fn combine_curves(
    kernel: &Kernel,
    existing: Option<&Shape>,
    incoming: &[Shape],
    mode: Mode,
) -> BuildResult<Shape> {
    let gathered: Vec<Shape> = match mode {
        Mode::Add => existing.into_iter().chain(incoming).cloned().collect(),
        Mode::Replace => incoming.to_vec(),
        Mode::Subtract | Mode::Intersect | Mode::Private => {
            return Err(BuildError::ModeNotSupported {
                context: "curves".to_string(),
                mode,
            });
        }
    };
    match gathered.as_slice() {
        [single] => Ok(single.clone()),
        shapes => Ok(kernel.compound(shapes)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use pcad_kernel::{Location, ShapeKind};

    fn sample_points() -> Vec<DVec3> {
        let steps: Vec<f64> = (0..14).map(|i| -2.013 + 0.293 * i as f64).collect();
        let mut points = Vec::new();
        for &x in &steps {
            for &y in &steps {
                for &z in &steps {
                    points.push(DVec3::new(x, y, z));
                }
            }
        }
        points
    }

    fn operands(kernel: &Kernel) -> (Shape, Shape, Shape) {
        let a = kernel.cuboid(DVec3::splat(2.0)).unwrap();
        let b = kernel
            .sphere(1.0)
            .unwrap()
            .moved(&Location::from_translation((1.0, 0.0, 0.0)))
            .unwrap();
        let c = kernel
            .cylinder(0.5, 3.0)
            .unwrap()
            .moved(&Location::from_translation((0.0, 0.7, 0.0)))
            .unwrap();
        (a, b, c)
    }

    fn add(kernel: &Kernel, a: &Shape, b: &Shape) -> Shape {
        combine(kernel, Some(a), b, Mode::Add).unwrap().unwrap()
    }

    fn sub(kernel: &Kernel, a: &Shape, b: &Shape) -> Shape {
        combine(kernel, Some(a), b, Mode::Subtract).unwrap().unwrap()
    }

    fn same_membership(left: &Shape, right: &Shape) -> bool {
        sample_points()
            .into_iter()
            .all(|p| left.contains(p) == right.contains(p))
    }

    #[test]
    fn test_add_is_commutative_and_associative() {
        let kernel = Kernel::csg();
        let (a, b, c) = operands(&kernel);
        assert!(same_membership(&add(&kernel, &a, &b), &add(&kernel, &b, &a)));
        let left = add(&kernel, &add(&kernel, &a, &b), &c);
        let right = add(&kernel, &a, &add(&kernel, &b, &c));
        assert!(same_membership(&left, &right));
    }

    #[test]
    fn test_intersect_matches_derived_identity() {
        let kernel = Kernel::csg();
        let (a, b, _) = operands(&kernel);
        let direct = combine(&kernel, Some(&a), &b, Mode::Intersect)
            .unwrap()
            .unwrap();
        let derived = sub(
            &kernel,
            &sub(&kernel, &add(&kernel, &a, &b), &sub(&kernel, &a, &b)),
            &sub(&kernel, &b, &a),
        );
        assert!(same_membership(&direct, &derived));
        assert!(direct.contains(DVec3::new(0.5, 0.0, 0.0)));
        assert!(!direct.contains(DVec3::new(-0.5, 0.0, 0.0)));
    }

    #[test]
    fn test_empty_base() {
        let kernel = Kernel::csg();
        let b = kernel.sphere(1.0).unwrap();
        for mode in [Mode::Subtract, Mode::Intersect] {
            assert!(matches!(
                combine(&kernel, None, &b, mode),
                Err(BuildError::EmptyBase { .. })
            ));
        }
        for mode in [Mode::Add, Mode::Replace] {
            let result = combine(&kernel, None, &b, mode).unwrap().unwrap();
            assert_eq!(result.id(), b.id());
        }
    }

    #[test]
    fn test_replace_discards_existing() {
        let kernel = Kernel::csg();
        let (a, b, _) = operands(&kernel);
        let result = combine(&kernel, Some(&a), &b, Mode::Replace)
            .unwrap()
            .unwrap();
        assert_eq!(result.id(), b.id());
    }

    #[test]
    fn test_private_leaves_existing_untouched() {
        let kernel = Kernel::csg();
        let (a, b, _) = operands(&kernel);
        let result = combine(&kernel, Some(&a), &b, Mode::Private)
            .unwrap()
            .unwrap();
        assert_eq!(result.id(), a.id());
        assert!(combine(&kernel, None, &b, Mode::Private).unwrap().is_none());
    }

    #[test]
    fn test_combine_many_matches_pairwise() {
        let kernel = Kernel::csg();
        let (a, b, c) = operands(&kernel);
        let batched = combine_many(&kernel, Some(&a), &[b.clone(), c.clone()], Mode::Subtract)
            .unwrap()
            .unwrap();
        let pairwise = sub(&kernel, &sub(&kernel, &a, &b), &c);
        assert!(same_membership(&batched, &pairwise));
    }

    #[test]
    fn test_curves_gather_into_compound() {
        let kernel = Kernel::csg();
        let first = kernel.line(DVec3::ZERO, DVec3::X).unwrap();
        let second = kernel.line(DVec3::X, DVec3::new(1.0, 1.0, 0.0)).unwrap();
        let joined = combine(&kernel, Some(&first), &second, Mode::Add)
            .unwrap()
            .unwrap();
        assert_eq!(joined.kind(), ShapeKind::Compound);
        assert_eq!(joined.edges().len(), 2);

        assert!(matches!(
            combine(&kernel, Some(&first), &second, Mode::Subtract),
            Err(BuildError::ModeNotSupported { .. })
        ));
    }
}

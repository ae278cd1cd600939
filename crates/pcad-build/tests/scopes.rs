//! Scope unwinding, cross-product ordering and the operator rule

use glam::DVec3;
use pcad_build::{
    BuildContext, BuildError, BuildPart, BuildResult, BuildSketch, Builder, Cuboid, GeomError,
    GridLocations, Location, Locations, Mode, Plane, PolarLocations, Rectangle, Select, Sphere,
    StackKind, Workplanes, open_builder_count,
};

fn all_depths(ctx: &BuildContext) -> [usize; 3] {
    [
        ctx.depth(StackKind::Locations),
        ctx.depth(StackKind::Workplanes),
        ctx.depth(StackKind::Builders),
    ]
}

fn failing_build(ctx: &BuildContext) -> BuildResult<()> {
    let _part = BuildPart::enter(ctx)?;
    let _locations = Locations::enter(ctx, [(1.0, 0.0, 0.0), (2.0, 0.0, 0.0)])?;
    let _planes = Workplanes::enter(ctx, [Plane::XZ])?;
    ctx.add(&Cuboid::new(1.0, 1.0, 1.0).mode(Mode::Subtract))?;
    Ok(())
}

#[test]
fn test_error_unwinds_every_stack() {
    let ctx = BuildContext::new();
    let before_locations = ctx.current_locations();
    let before_planes = ctx.current_workplanes();

    let err = failing_build(&ctx);
    assert!(matches!(err, Err(BuildError::EmptyBase { mode: Mode::Subtract })));

    assert_eq!(all_depths(&ctx), [0, 0, 0]);
    assert_eq!(ctx.current_locations(), before_locations);
    assert_eq!(ctx.current_workplanes(), before_planes);
    assert_eq!(open_builder_count(), 0);
}

#[test]
fn test_panic_unwinds_every_stack() {
    let ctx = BuildContext::new();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _part = BuildPart::enter(&ctx).unwrap();
        let _sketch = BuildSketch::enter(&ctx).unwrap();
        let _locations = Locations::enter(&ctx, [(1.0, 0.0, 0.0)]).unwrap();
        panic!("interrupted build");
    }));
    assert!(outcome.is_err());
    assert_eq!(all_depths(&ctx), [0, 0, 0]);
    assert_eq!(open_builder_count(), 0);
}

#[test]
fn test_cross_product_size_and_order() {
    let ctx = BuildContext::new();
    for n in 1..=4usize {
        for m in 1..=4usize {
            let outer: Vec<Location> = (0..n)
                .map(|i| Location::from_translation((100.0 * i as f64, 0.0, 0.0)))
                .collect();
            let inner: Vec<Location> = (0..m)
                .map(|j| Location::from_translation((0.0, j as f64, 0.0)))
                .collect();
            let _outer = Locations::enter(&ctx, outer).unwrap();
            let _inner = Locations::enter(&ctx, inner).unwrap();

            let current = ctx.current_locations();
            assert_eq!(current.len(), m * n);
            for (k, location) in current.iter().enumerate() {
                let expected = DVec3::new(100.0 * (k / m) as f64, (k % m) as f64, 0.0);
                assert!(location.position().abs_diff_eq(expected, 1e-12));
            }
            assert_eq!(ctx.current_locations(), current);
        }
    }
    assert_eq!(ctx.depth(StackKind::Locations), 0);
}

#[test]
fn test_objects_follow_cross_product_order() {
    let ctx = BuildContext::new();
    let part = BuildPart::enter(&ctx).unwrap();
    let outer = Locations::enter(&ctx, [(0.0, 0.0, 0.0), (0.0, 0.0, 50.0)]).unwrap();
    let grid = GridLocations::new(10.0, 10.0, 2, 1).enter(&ctx).unwrap();
    let spheres = ctx.add(&Sphere::new(1.0)).unwrap();
    let centers: Vec<DVec3> = spheres.iter().map(|s| s.center()).collect();
    let expected = [
        DVec3::new(-5.0, 0.0, 0.0),
        DVec3::new(5.0, 0.0, 0.0),
        DVec3::new(-5.0, 0.0, 50.0),
        DVec3::new(5.0, 0.0, 50.0),
    ];
    for (center, expected) in centers.iter().zip(expected) {
        assert!(center.abs_diff_eq(expected, 1e-9));
    }
    grid.exit().unwrap();
    outer.exit().unwrap();
    assert_eq!(part.solids(Select::All).len(), 4);
}

#[test]
fn test_polar_pattern_in_sketch() {
    let ctx = BuildContext::new();
    let sketch = BuildSketch::enter(&ctx).unwrap();
    {
        let _polar = PolarLocations::new(5.0, 6).enter(&ctx).unwrap();
        let placed = ctx.add(&Rectangle::new(1.0, 1.0)).unwrap();
        assert_eq!(placed.len(), 6);
        assert!(placed[0].center().abs_diff_eq(DVec3::new(5.0, 0.0, 0.0), 1e-9));
    }
    assert_eq!(sketch.faces(Select::Last).len(), 6);
    sketch.finish().unwrap();
}

#[test]
fn test_wrong_builder_kind_is_a_scope_error() {
    let ctx = BuildContext::new();
    let part = BuildPart::enter(&ctx).unwrap();
    let err = ctx.add(&Rectangle::new(1.0, 1.0));
    match err {
        Err(BuildError::NoBuilder { operation, active, .. }) => {
            assert_eq!(operation, "Rectangle");
            assert!(active.contains("part"));
        }
        other => panic!("expected a scope error, got {other:?}"),
    }
    part.finish().unwrap();
}

#[test]
fn test_standalone_objects_use_active_locations() {
    let ctx = BuildContext::new();
    let _locations = Locations::enter(&ctx, [(1.0, 2.0, 3.0)]).unwrap();
    let shapes = ctx.add(&Cuboid::new(1.0, 1.0, 1.0)).unwrap();
    assert_eq!(shapes.len(), 1);
    assert!(shapes[0].center().abs_diff_eq(DVec3::new(1.0, 2.0, 3.0), 1e-9));
}

#[test]
fn test_operators_refused_while_any_builder_is_open() {
    let ctx = BuildContext::new();
    let a = ctx.kernel().cuboid(DVec3::ONE).unwrap();
    let b = ctx.kernel().sphere(0.75).unwrap();
    {
        let _part = BuildPart::enter(&ctx).unwrap();
        let other = BuildContext::new();
        let _sketch = BuildSketch::enter(&other).unwrap();
        assert_eq!(open_builder_count(), 2);
        assert!(matches!(
            &a - &b,
            Err(BuildError::AlgebraInsideBuilder { builders: 2, .. })
        ));
        assert!(matches!(
            Plane::XY * &a,
            Err(BuildError::AlgebraInsideBuilder { .. })
        ));
    }
    assert_eq!(open_builder_count(), 0);
    let cut = (&a - &b).unwrap();
    assert!(!cut.contains(DVec3::ZERO));
    assert!(cut.contains(DVec3::splat(0.49)));
}

#[test]
fn test_non_finite_location_rejected_on_entry() {
    let ctx = BuildContext::new();
    let err = Locations::enter(&ctx, [(0.0, 0.0, 0.0), (f64::NAN, 0.0, 0.0)]);
    assert!(matches!(
        err,
        Err(BuildError::Geom(GeomError::DegenerateLocation(_)))
    ));
    let spun = Location::from_euler_deg(DVec3::ZERO, (f64::INFINITY, 0.0, 0.0));
    assert!(Locations::enter(&ctx, [spun]).is_err());
    assert_eq!(ctx.depth(StackKind::Locations), 0);
}

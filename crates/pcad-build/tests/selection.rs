//! Selecting from builder results

use approx::assert_relative_eq;
use glam::DVec3;
use pcad_build::{
    Axis, BuildConfig, BuildContext, BuildError, BuildPart, Builder, Cuboid, Cylinder, GeomType,
    Select, ShapeKind, ShapeList, SortBy,
};

#[test]
fn test_box_faces_grouped_by_height() {
    let ctx = BuildContext::new();
    let part = BuildPart::enter(&ctx).unwrap();
    ctx.add(&Cuboid::new(10.0, 10.0, 10.0)).unwrap();

    let faces = part.faces(Select::All);
    assert_eq!(faces.len(), 6);
    assert_eq!(faces.filter_by(GeomType::Plane).len(), 6);

    let groups = faces.group_by(SortBy::Axis(Axis::Z)).unwrap();
    assert_eq!(groups.len(), 3);
    assert_eq!(groups.first().unwrap().len(), 1);
    assert_eq!(groups.get(1).unwrap().len(), 4);
    let top = groups.get(-1).unwrap();
    assert_eq!(top.len(), 1);
    assert_relative_eq!(top[0].center().z, 5.0, epsilon = 1e-9);

    // every face lands in exactly one group
    let mut ids: Vec<_> = groups.iter().flat_map(|g| g.iter().map(|f| f.id())).collect();
    ids.sort();
    let mut expected: Vec<_> = faces.iter().map(|f| f.id()).collect();
    expected.sort();
    assert_eq!(ids, expected);
    part.finish().unwrap();
}

#[test]
fn test_equal_keys_keep_order() {
    let ctx = BuildContext::new();
    let part = BuildPart::enter(&ctx).unwrap();
    ctx.add(&Cuboid::new(4.0, 4.0, 4.0)).unwrap();
    let vertices = part.vertices(Select::All);
    assert_eq!(vertices.len(), 8);

    // every corner is equally far from the origin
    let sorted = vertices.sort_by(SortBy::Distance).unwrap();
    let before: Vec<_> = vertices.iter().map(|v| v.id()).collect();
    let after: Vec<_> = sorted.iter().map(|v| v.id()).collect();
    assert_eq!(before, after);

    let by_height = vertices.sort_by(SortBy::Axis(Axis::Z)).unwrap();
    let expected: Vec<_> = vertices
        .iter()
        .filter(|v| v.center().z < 0.0)
        .chain(vertices.iter().filter(|v| v.center().z > 0.0))
        .map(|v| v.id())
        .collect();
    let actual: Vec<_> = by_height.iter().map(|v| v.id()).collect();
    assert_eq!(actual, expected);
    part.finish().unwrap();
}

#[test]
fn test_filter_by_position_and_axis() {
    let ctx = BuildContext::new();
    let part = BuildPart::enter(&ctx).unwrap();
    ctx.add(&Cuboid::new(2.0, 4.0, 6.0)).unwrap();

    let top = part
        .faces(Select::All)
        .filter_by_position(&Axis::Z, 2.9, 3.1, (true, true));
    assert_eq!(top.len(), 1);
    let sides = part
        .faces(Select::All)
        .filter_by_position(&Axis::Z, -2.9, 2.9, (false, false));
    assert_eq!(sides.len(), 4);
    let above = part
        .faces(Select::All)
        .filter_by_position(&Axis::Z, 3.1, 10.0, (false, true));
    assert!(above.is_empty());

    let vertical = part.edges(Select::All).filter_by_axis(&Axis::Z);
    assert_eq!(vertical.len(), 4);
    let longest = part.edges(Select::All).sort_by(SortBy::Length).unwrap();
    assert_relative_eq!(longest.get(-1).unwrap().length().unwrap(), 6.0, epsilon = 1e-9);
    part.finish().unwrap();
}

#[test]
fn test_meaningless_key_is_an_error() {
    let ctx = BuildContext::new();
    let part = BuildPart::enter(&ctx).unwrap();
    ctx.add(&Cuboid::new(1.0, 1.0, 1.0)).unwrap();
    let err = part.vertices(Select::All).sort_by(SortBy::Radius);
    assert!(matches!(
        err,
        Err(BuildError::KeyMismatch {
            key: SortBy::Radius,
            kind: ShapeKind::Vertex
        })
    ));
    part.finish().unwrap();
}

#[test]
fn test_cylinder_faces_by_type() {
    let ctx = BuildContext::new();
    let part = BuildPart::enter(&ctx).unwrap();
    ctx.add(&Cylinder::new(1.0, 2.0)).unwrap();
    let faces = part.faces(Select::All);
    assert_eq!(faces.len(), 3);
    assert_eq!(faces.filter_by(GeomType::Cylinder).len(), 1);
    assert_eq!(faces.filter_by(GeomType::Plane).len(), 2);
    let circles = part.edges(Select::All).filter_by(GeomType::Circle);
    assert_eq!(circles.len(), 2);
    assert!(circles.iter().all(|c| c.radius() == Some(1.0)));
    part.finish().unwrap();
}

#[test]
fn test_builder_groups_at_configured_precision() {
    let ctx = BuildContext::from_config(BuildConfig {
        group_digits: 1,
        ..BuildConfig::default()
    });
    let part = BuildPart::enter(&ctx).unwrap();
    let points: ShapeList = [1.0, 1.04, 2.0]
        .into_iter()
        .map(|x| ctx.kernel().vertex(DVec3::new(x, 0.0, 0.0)).unwrap())
        .collect();

    let coarse = part.group(&points, SortBy::Axis(Axis::X)).unwrap();
    assert_eq!(coarse.len(), 2);
    assert_eq!(coarse.first().unwrap().len(), 2);
    assert_eq!(points.group_by(SortBy::Axis(Axis::X)).unwrap().len(), 3);
    part.finish().unwrap();
}

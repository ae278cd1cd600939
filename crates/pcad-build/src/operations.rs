//! Operations that consume a builder's pending geometry

use crate::builder::BuilderKind;
use crate::context::BuildContext;
use crate::error::{BuildError, BuildResult};
use crate::mode::Mode;
use crate::shape::Shape;

/// Extrude every pending face of the nearest part builder
///
/// Each face is extruded along the normal of the plane it was handed off on.
/// A negative amount extrudes the other way. The pending faces are cleared
/// only once the solids have been combined. Returns the new solids.
pub fn extrude(ctx: &BuildContext, amount: f64, mode: Mode) -> BuildResult<Vec<Shape>> {
    let id = ctx
        .topmost_builder(BuilderKind::Part)
        .ok_or_else(|| ctx.no_builder("extrude", BuilderKind::Part))?;
    let faces = ctx.pending_faces(id)?;
    let planes = ctx.pending_face_planes(id)?;
    if faces.is_empty() {
        return Err(BuildError::NothingToConsume {
            builder: BuilderKind::Part,
            what: "faces",
        });
    }

    let solids = faces
        .iter()
        .zip(&planes)
        .map(|(face, plane)| Ok(ctx.kernel().extrude(face, plane.z_dir() * amount)?))
        .collect::<BuildResult<Vec<_>>>()?;
    tracing::debug!("extruded {} face(s) by {amount}", solids.len());
    let accepted = ctx.accept(id, solids, mode)?;
    ctx.take_pending_faces(id)?;
    Ok(accepted)
}

/// Turn the pending edges of the nearest sketch builder into a face
pub fn make_face(ctx: &BuildContext, mode: Mode) -> BuildResult<Vec<Shape>> {
    let id = ctx
        .topmost_builder(BuilderKind::Sketch)
        .ok_or_else(|| ctx.no_builder("make_face", BuilderKind::Sketch))?;
    let edges = ctx.pending_edges(id)?;
    if edges.is_empty() {
        return Err(BuildError::NothingToConsume {
            builder: BuilderKind::Sketch,
            what: "edges",
        });
    }
    let face = ctx.kernel().make_face(&edges)?;
    let accepted = ctx.accept(id, vec![face], mode)?;
    ctx.take_pending_edges(id)?;
    Ok(accepted)
}

/// Extrude a planar face along its normal, outside any builder
pub fn extrude_face(face: &Shape, amount: f64) -> BuildResult<Shape> {
    let plane = face.plane().ok_or(BuildError::NonPlanarFace)?;
    Ok(face.kernel().extrude(face, plane.z_dir() * amount)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glam::DVec3;

    #[test]
    fn test_extrude_face_standalone() {
        let ctx = BuildContext::new();
        let disk = ctx.kernel().disk(1.0).unwrap();
        let solid = extrude_face(&disk, 2.0).unwrap();
        assert_eq!(solid.dimension(), 3);
        assert_relative_eq!(solid.volume().unwrap(), 2.0 * std::f64::consts::PI, epsilon = 1e-9);
        assert_relative_eq!(solid.bounding_box().max.z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_extrude_needs_part_builder() {
        let ctx = BuildContext::new();
        assert!(matches!(
            extrude(&ctx, 1.0, Mode::Add),
            Err(BuildError::NoBuilder { required: BuilderKind::Part, .. })
        ));
    }

    #[test]
    fn test_extrude_face_rejects_solids() {
        let ctx = BuildContext::new();
        let cube = ctx.kernel().cuboid(DVec3::ONE).unwrap();
        assert!(matches!(
            extrude_face(&cube, 1.0),
            Err(BuildError::NonPlanarFace)
        ));
    }
}

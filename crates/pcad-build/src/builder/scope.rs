//! Builder scope guards

use pcad_kernel::ShapeKind;

use super::{BuilderId, BuilderKind, BuilderOptions, BuilderState, Closing};
use crate::context::BuildContext;
use crate::error::BuildResult;
use crate::mode::Mode;
use crate::shape::Shape;
use crate::shape_list::{Select, ShapeGroups, ShapeList, SortBy};

/// Keeps a builder open; closes it and hands off its result when dropped
#[derive(Debug)]
struct BuilderScope<'a> {
    ctx: &'a BuildContext,
    id: BuilderId,
}

impl<'a> BuilderScope<'a> {
    fn enter(ctx: &'a BuildContext, kind: BuilderKind, options: BuilderOptions) -> BuildResult<Self> {
        let id = ctx.enter_builder(kind, options)?;
        Ok(Self { ctx, id })
    }

    fn finish(&self) -> BuildResult<()> {
        self.ctx.close_builder(self.id, Closing::Strict)
    }
}

impl Drop for BuilderScope<'_> {
    fn drop(&mut self) {
        if !matches!(self.ctx.builder_state(self.id), Ok(BuilderState::Open)) {
            return;
        }
        let closing = if std::thread::panicking() {
            Closing::Abandoned
        } else {
            Closing::Forced
        };
        if let Err(e) = self.ctx.close_builder(self.id, closing) {
            tracing::warn!("Closing builder {} on drop failed: {}", self.id, e);
        }
    }
}

/// Queries shared by every builder guard
pub trait Builder {
    fn context(&self) -> &BuildContext;

    fn id(&self) -> BuilderId;

    fn kind(&self) -> BuilderKind;

    fn state(&self) -> BuilderState {
        self.context()
            .builder_state(self.id())
            .unwrap_or(BuilderState::Closed)
    }

    /// How the result merges into a parent of the same kind
    fn mode(&self) -> Mode {
        self.context().builder_mode(self.id()).unwrap_or_default()
    }

    fn vertices(&self, select: Select) -> ShapeList {
        self.select(ShapeKind::Vertex, select)
    }

    fn edges(&self, select: Select) -> ShapeList {
        self.select(ShapeKind::Edge, select)
    }

    fn wires(&self, select: Select) -> ShapeList {
        self.select(ShapeKind::Wire, select)
    }

    fn faces(&self, select: Select) -> ShapeList {
        self.select(ShapeKind::Face, select)
    }

    fn solids(&self, select: Select) -> ShapeList {
        self.select(ShapeKind::Solid, select)
    }

    fn select(&self, kind: ShapeKind, select: Select) -> ShapeList {
        self.context()
            .select(self.id(), kind, select)
            .unwrap_or_default()
    }

    fn pending_edges(&self) -> ShapeList {
        self.context().pending_edges(self.id()).unwrap_or_default()
    }

    fn pending_faces(&self) -> ShapeList {
        self.context().pending_faces(self.id()).unwrap_or_default()
    }

    /// Accumulated result in the builder's own frame
    fn result(&self) -> Option<Shape> {
        self.context().builder_result(self.id()).ok().flatten()
    }

    /// Group shapes at the context's configured key precision
    fn group(&self, shapes: &ShapeList, key: SortBy) -> BuildResult<ShapeGroups> {
        shapes.group_by_with(key, self.context().config().group_digits)
    }
}

macro_rules! builder_guard {
    ($(#[$doc:meta])* $name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug)]
        pub struct $name<'a> {
            scope: BuilderScope<'a>,
        }

        impl<'a> $name<'a> {
            pub fn enter(ctx: &'a BuildContext) -> BuildResult<Self> {
                Self::enter_with(ctx, BuilderOptions::default())
            }

            pub fn enter_with(ctx: &'a BuildContext, options: BuilderOptions) -> BuildResult<Self> {
                Ok(Self {
                    scope: BuilderScope::enter(ctx, $kind, options)?,
                })
            }

            /// Close the scope and return the finished result
            ///
            /// Fails if another scope entered inside this one is still open;
            /// the builder is then closed forcibly when the guard drops.
            pub fn finish(self) -> BuildResult<Option<Shape>> {
                self.scope.finish()?;
                self.scope.ctx.placed_result(self.scope.id)
            }
        }

        impl Builder for $name<'_> {
            fn context(&self) -> &BuildContext {
                self.scope.ctx
            }

            fn id(&self) -> BuilderId {
                self.scope.id
            }

            fn kind(&self) -> BuilderKind {
                $kind
            }
        }
    };
}

builder_guard!(
    /// Accumulates edges into a line
    BuildLine,
    BuilderKind::Line
);

builder_guard!(
    /// Accumulates faces in a local XY frame
    ///
    /// The result is placed on every workplane and location active outside
    /// the sketch when it closes.
    BuildSketch,
    BuilderKind::Sketch
);

builder_guard!(
    /// Accumulates solids
    BuildPart,
    BuilderKind::Part
);

impl BuildLine<'_> {
    pub fn line(&self) -> Option<Shape> {
        self.result()
    }
}

impl BuildSketch<'_> {
    /// The sketch in its local frame
    pub fn sketch_local(&self) -> Option<Shape> {
        self.result()
    }

    /// The sketch placed at every location it will be handed off at
    pub fn sketch(&self) -> BuildResult<Option<Shape>> {
        let Some(local) = self.result() else {
            return Ok(None);
        };
        let targets = self.scope.ctx.with_builder(self.scope.id, |data| data.targets.clone())?;
        let placed = targets
            .iter()
            .map(|target| local.moved(target))
            .collect::<Result<Vec<_>, _>>()?;
        match placed.as_slice() {
            [single] => Ok(Some(single.clone())),
            shapes => Ok(Some(self.scope.ctx.kernel().compound(shapes)?)),
        }
    }
}

impl BuildPart<'_> {
    pub fn part(&self) -> Option<Shape> {
        self.result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::StackKind;
    use crate::error::BuildError;
    use glam::DVec3;
    use pcad_kernel::{Location, Plane};

    #[test]
    fn test_drop_closes_and_hands_off() {
        let ctx = BuildContext::new();
        let part = BuildPart::enter(&ctx).unwrap();
        {
            let inner = BuildPart::enter(&ctx).unwrap();
            let cube = ctx.kernel().cuboid(DVec3::ONE).unwrap();
            ctx.accept(inner.id(), vec![cube], Mode::Add).unwrap();
        }
        assert_eq!(part.solids(Select::All).len(), 1);
        let result = part.finish().unwrap().unwrap();
        assert!((result.volume().unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(ctx.depth(StackKind::Builders), 0);
    }

    #[test]
    fn test_finish_out_of_order_then_unwind() {
        let ctx = BuildContext::new();
        let outer = BuildPart::enter(&ctx).unwrap();
        let inner = BuildSketch::enter(&ctx).unwrap();
        assert!(matches!(
            outer.finish(),
            Err(BuildError::OutOfOrderExit { .. })
        ));
        // the outer guard was forced closed when finish consumed it
        assert_eq!(ctx.depth(StackKind::Builders), 1);
        assert_eq!(inner.state(), BuilderState::Open);
        inner.finish().unwrap();
        assert_eq!(ctx.depth(StackKind::Builders), 0);
    }

    #[test]
    fn test_sketch_placed_on_plane_and_locations() {
        let ctx = BuildContext::new();
        let _locations =
            crate::context::Locations::enter(&ctx, [(0.0, 0.0, 0.0), (5.0, 0.0, 0.0)]).unwrap();
        let sketch = BuildSketch::enter_with(&ctx, BuilderOptions::default().on(Plane::XZ)).unwrap();
        assert_eq!(ctx.placements_for(sketch.id()).unwrap(), vec![Location::IDENTITY]);
        let disk = ctx.kernel().disk(1.0).unwrap();
        ctx.accept(sketch.id(), vec![disk], Mode::Add).unwrap();
        let placed = sketch.sketch().unwrap().unwrap();
        assert_eq!(placed.faces().len(), 2);
        for face in placed.faces().iter() {
            assert!(face.direction().unwrap().abs_diff_eq(DVec3::NEG_Y, 1e-9));
        }
        let finished = sketch.finish().unwrap().unwrap();
        assert!((finished.bounding_box().center().x - 2.5).abs() < 1e-9);
    }
}

//! Builders
//!
//! A builder is an accumulating scope of fixed dimension. Objects built
//! while it is the nearest builder of their kind are combined into its
//! result; lower-dimensional geometry waits in its pending collections until
//! an operation consumes it. When a builder closes its result is handed to
//! the enclosing builder, if one of a compatible kind is open.

mod scope;

pub use scope::{BuildLine, BuildPart, BuildSketch, Builder};

use std::fmt;

use pcad_kernel::{Location, Plane, ShapeKind};

use crate::combine::combine_many;
use crate::context::{BuildContext, BuilderFrame, FrameBase, FrameToken, StackKind};
use crate::context::{note_builder_closed, note_builder_opened};
use crate::error::{BuildError, BuildResult};
use crate::mode::Mode;
use crate::shape::Shape;
use crate::shape_list::{Select, ShapeList};

/// The three builder dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuilderKind {
    /// Accumulates curves
    Line,
    /// Accumulates planar faces in a local XY frame
    Sketch,
    /// Accumulates solids
    Part,
}

impl BuilderKind {
    /// Whether a shape of this dimension may be added to the builder
    pub fn accepts(self, dimension: u8) -> bool {
        match self {
            BuilderKind::Line => dimension == 1,
            BuilderKind::Sketch => matches!(dimension, 1 | 2),
            BuilderKind::Part => matches!(dimension, 1..=3),
        }
    }

    /// The builder whose result has this dimension
    pub fn for_dimension(dimension: u8) -> Self {
        match dimension {
            0 | 1 => BuilderKind::Line,
            2 => BuilderKind::Sketch,
            _ => BuilderKind::Part,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            BuilderKind::Line => "1D",
            BuilderKind::Sketch => "1D or 2D",
            BuilderKind::Part => "1D, 2D or 3D",
        }
    }

    /// Dimension of the accumulated result
    pub fn result_dimension(self) -> u8 {
        match self {
            BuilderKind::Line => 1,
            BuilderKind::Sketch => 2,
            BuilderKind::Part => 3,
        }
    }
}

impl fmt::Display for BuilderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuilderKind::Line => "line",
            BuilderKind::Sketch => "sketch",
            BuilderKind::Part => "part",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderState {
    #[default]
    Open,
    Closed,
}

/// Handle to a builder's state inside its context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BuilderId(pub(crate) usize);

impl fmt::Display for BuilderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Settings for entering a builder
#[derive(Debug, Clone, Default)]
pub struct BuilderOptions {
    /// Workplanes pushed for the lifetime of the builder
    pub planes: Vec<Plane>,
    /// How the finished result merges into a parent of the same kind
    pub mode: Mode,
}

impl BuilderOptions {
    pub fn on(mut self, plane: Plane) -> Self {
        self.planes.push(plane);
        self
    }

    pub fn on_planes(mut self, planes: impl IntoIterator<Item = Plane>) -> Self {
        self.planes.extend(planes);
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }
}

/// How a builder is being closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Closing {
    /// Frames must be on top; errors propagate
    Strict,
    /// Frames are removed wherever they are; the result is still handed off
    Forced,
    /// Frames are removed and nothing is handed off
    Abandoned,
}

/// Per-builder state, stored in the context's arena
#[derive(Debug)]
pub(crate) struct BuilderData {
    pub kind: BuilderKind,
    pub mode: Mode,
    pub state: BuilderState,
    pub parent: Option<BuilderId>,
    pub token: FrameToken,
    pub plane_token: Option<FrameToken>,
    /// Stack depths from which placements are taken, when the builder works
    /// in a sketch-local frame
    pub local_base: Option<FrameBase>,
    /// Where a sketch's result is placed when it closes
    pub targets: Vec<Location>,
    pub result: Option<Shape>,
    pub placed: Vec<Shape>,
    pub pending_edges: Vec<Shape>,
    pub pending_faces: Vec<(Shape, Plane)>,
    /// Shapes from the most recent non-private contribution
    pub last: Vec<Shape>,
}

impl BuildContext {
    fn with_builder<R>(&self, id: BuilderId, f: impl FnOnce(&BuilderData) -> R) -> BuildResult<R> {
        self.arena
            .borrow()
            .get(id.0)
            .map(f)
            .ok_or(BuildError::UnknownBuilder(id))
    }

    fn with_builder_mut<R>(
        &self,
        id: BuilderId,
        f: impl FnOnce(&mut BuilderData) -> R,
    ) -> BuildResult<R> {
        self.arena
            .borrow_mut()
            .get_mut(id.0)
            .map(f)
            .ok_or(BuildError::UnknownBuilder(id))
    }

    /// Open builder state, or an error naming the closed builder
    fn with_open_builder_mut<R>(
        &self,
        id: BuilderId,
        f: impl FnOnce(&mut BuilderData) -> R,
    ) -> BuildResult<R> {
        self.with_builder_mut(id, |data| match data.state {
            BuilderState::Open => Ok(f(data)),
            BuilderState::Closed => Err(BuildError::BuilderClosed(data.kind)),
        })?
    }

    /// Register a builder on the builders stack
    pub(crate) fn enter_builder(
        &self,
        kind: BuilderKind,
        options: BuilderOptions,
    ) -> BuildResult<BuilderId> {
        let parent = self.builders.borrow().top().copied();
        let parent_base = match parent {
            Some(frame) => self.with_builder(frame.id, |data| data.local_base)?,
            None => None,
        };

        let plane_token = if options.planes.is_empty() {
            None
        } else {
            Some(self.push_workplanes(options.planes)?)
        };

        // a sketch starts a local frame; the frames around it, its own
        // planes included, decide where its result lands
        let (local_base, targets) = match kind {
            BuilderKind::Sketch => (
                Some(self.frame_base()),
                self.placements_from(parent_base.unwrap_or_default()),
            ),
            _ => (parent_base, Vec::new()),
        };

        let id = BuilderId(self.arena.borrow().len());
        let token = self.builders.borrow_mut().push(BuilderFrame { kind, id });
        self.arena.borrow_mut().push(BuilderData {
            kind,
            mode: options.mode,
            state: BuilderState::Open,
            parent: parent.map(|frame| frame.id),
            token,
            plane_token,
            local_base,
            targets,
            result: None,
            placed: Vec::new(),
            pending_edges: Vec::new(),
            pending_faces: Vec::new(),
            last: Vec::new(),
        });
        note_builder_opened();
        tracing::debug!("enter {kind} builder {id} (mode {})", options.mode);
        Ok(id)
    }

    /// Locations at which objects added to a builder are placed
    pub fn placements_for(&self, id: BuilderId) -> BuildResult<Vec<Location>> {
        let base = self.with_builder(id, |data| data.local_base)?;
        Ok(self.placements_from(base.unwrap_or_default()))
    }

    /// Feed shapes into a builder
    ///
    /// Shapes of the builder's own dimension are combined into the result
    /// with `mode`; lower-dimensional shapes go to the pending collections.
    /// Everything is validated before the builder is touched. Returns the
    /// shapes as given.
    pub fn accept(&self, id: BuilderId, shapes: Vec<Shape>, mode: Mode) -> BuildResult<Vec<Shape>> {
        let (kind, state, existing) =
            self.with_builder(id, |data| (data.kind, data.state, data.result.clone()))?;
        if state == BuilderState::Closed {
            return Err(BuildError::BuilderClosed(kind));
        }

        let mut contributions = Vec::new();
        let mut edges = Vec::new();
        let mut faces = Vec::new();
        for shape in &shapes {
            let dimension = shape.dimension();
            if !kind.accepts(dimension) {
                return Err(BuildError::DimensionMismatch {
                    target: format!("{kind} builder {id}"),
                    expected: kind.expected(),
                    found: dimension,
                });
            }
            if dimension == kind.result_dimension() {
                contributions.push(shape.clone());
            } else if dimension == 1 {
                edges.push(shape.clone());
            } else {
                let plane = shape.plane().ok_or(BuildError::NonPlanarFace)?;
                faces.push((shape.clone(), plane));
            }
        }
        if (!edges.is_empty() || !faces.is_empty()) && !matches!(mode, Mode::Add | Mode::Private) {
            return Err(BuildError::ModeNotSupported {
                context: format!("pending geometry in {kind} builder {id}"),
                mode,
            });
        }
        if kind == BuilderKind::Line && mode.needs_base() {
            return Err(BuildError::ModeNotSupported {
                context: format!("curves in line builder {id}"),
                mode,
            });
        }
        if mode == Mode::Private {
            tracing::trace!("{} private shape(s) kept out of {kind} builder {id}", shapes.len());
            return Ok(shapes);
        }

        let result = combine_many(self.kernel(), existing.as_ref(), &contributions, mode)?;
        self.with_builder_mut(id, |data| {
            data.result = result;
            data.pending_edges.extend(edges);
            data.pending_faces.extend(faces);
            data.last = shapes.clone();
        })?;
        tracing::trace!("{kind} builder {id} accepted {} shape(s) with {mode}", shapes.len());
        Ok(shapes)
    }

    /// Close a builder, release its frames and hand its result on
    pub(crate) fn close_builder(&self, id: BuilderId, closing: Closing) -> BuildResult<()> {
        let (kind, state, token, plane_token) = self.with_builder(id, |data| {
            (data.kind, data.state, data.token, data.plane_token)
        })?;
        if state == BuilderState::Closed {
            return Err(BuildError::BuilderClosed(kind));
        }

        if closing == Closing::Strict {
            self.builders.borrow().check_top(token)?;
            if let Some(plane_token) = plane_token {
                self.workplanes.borrow().check_top(plane_token)?;
            }
        }
        self.release_frame(StackKind::Builders, token);
        if let Some(plane_token) = plane_token {
            self.release_frame(StackKind::Workplanes, plane_token);
        }

        // stays closed even if placing or handing off fails
        self.with_builder_mut(id, |data| data.state = BuilderState::Closed)?;
        note_builder_closed();
        tracing::debug!("exit {kind} builder {id}");

        if closing == Closing::Abandoned {
            return Ok(());
        }
        let placed = self.place_result(id)?;
        self.with_builder_mut(id, |data| data.placed = placed)?;
        self.hand_off(id)
    }

    fn release_frame(&self, kind: StackKind, token: FrameToken) {
        if let Err(e) = self.exit_scope(kind, token) {
            tracing::error!("{e}; removing the frame anyway");
            self.force_exit_scope(kind, token);
        }
    }

    /// Copies of a sketch's result at each of its targets
    fn place_result(&self, id: BuilderId) -> BuildResult<Vec<Shape>> {
        let (kind, result, targets) =
            self.with_builder(id, |data| (data.kind, data.result.clone(), data.targets.clone()))?;
        match (kind, result) {
            (BuilderKind::Sketch, Some(result)) => targets
                .iter()
                .map(|target| Ok(result.moved(target)?))
                .collect(),
            (_, Some(result)) => Ok(vec![result]),
            (_, None) => Ok(Vec::new()),
        }
    }

    fn hand_off(&self, id: BuilderId) -> BuildResult<()> {
        let (kind, mode, parent, placed, targets) = self.with_builder(id, |data| {
            (
                data.kind,
                data.mode,
                data.parent,
                data.placed.clone(),
                data.targets.clone(),
            )
        })?;
        let Some(parent) = parent else {
            return Ok(());
        };
        if mode == Mode::Private || placed.is_empty() {
            tracing::debug!("{kind} builder {id} keeps its result");
            return Ok(());
        }
        let (parent_kind, parent_state) = self.with_builder(parent, |data| (data.kind, data.state))?;
        if parent_state == BuilderState::Closed {
            tracing::debug!("{parent_kind} builder {parent} already closed; {kind} builder {id} keeps its result");
            return Ok(());
        }

        match (kind, parent_kind) {
            (BuilderKind::Line, BuilderKind::Sketch | BuilderKind::Part) => {
                let edges: Vec<Shape> = placed.iter().flat_map(|s| s.edges()).collect();
                tracing::debug!("{kind} builder {id} hands {} edge(s) to {parent_kind} builder {parent}", edges.len());
                self.with_open_builder_mut(parent, |data| data.pending_edges.extend(edges))
            }
            (BuilderKind::Line, BuilderKind::Line) => {
                let edges: Vec<Shape> = placed.iter().flat_map(|s| s.edges()).collect();
                self.accept(parent, edges, Mode::Add).map(drop)
            }
            (BuilderKind::Sketch, BuilderKind::Part) => {
                let mut faces = Vec::new();
                for (copy, target) in placed.iter().zip(&targets) {
                    let plane = Plane::from_location(target);
                    faces.extend(copy.faces().into_iter().map(|face| (face, plane)));
                }
                tracing::debug!("{kind} builder {id} hands {} face(s) to {parent_kind} builder {parent}", faces.len());
                self.with_open_builder_mut(parent, |data| data.pending_faces.extend(faces))
            }
            (BuilderKind::Sketch, BuilderKind::Sketch) | (BuilderKind::Part, BuilderKind::Part) => {
                tracing::debug!("{kind} builder {id} merges into {parent_kind} builder {parent} with {mode}");
                self.accept(parent, placed, mode).map(drop)
            }
            _ => {
                tracing::debug!("{parent_kind} builder {parent} does not take a {kind} result");
                Ok(())
            }
        }
    }

    pub fn builder_kind(&self, id: BuilderId) -> BuildResult<BuilderKind> {
        self.with_builder(id, |data| data.kind)
    }

    pub fn builder_state(&self, id: BuilderId) -> BuildResult<BuilderState> {
        self.with_builder(id, |data| data.state)
    }

    pub fn builder_mode(&self, id: BuilderId) -> BuildResult<Mode> {
        self.with_builder(id, |data| data.mode)
    }

    /// Accumulated result in the builder's own frame
    pub fn builder_result(&self, id: BuilderId) -> BuildResult<Option<Shape>> {
        self.with_builder(id, |data| data.result.clone())
    }

    /// Result placed on its targets; available once the builder is closed
    pub fn placed_result(&self, id: BuilderId) -> BuildResult<Option<Shape>> {
        let placed = self.with_builder(id, |data| data.placed.clone())?;
        match placed.as_slice() {
            [] => Ok(None),
            [single] => Ok(Some(single.clone())),
            shapes => Ok(Some(self.kernel().compound(shapes)?)),
        }
    }

    pub fn pending_edges(&self, id: BuilderId) -> BuildResult<ShapeList> {
        self.with_builder(id, |data| data.pending_edges.iter().cloned().collect())
    }

    pub fn pending_faces(&self, id: BuilderId) -> BuildResult<ShapeList> {
        self.with_builder(id, |data| {
            data.pending_faces
                .iter()
                .map(|(face, _)| face.clone())
                .collect()
        })
    }

    /// Planes recorded alongside each pending face
    pub fn pending_face_planes(&self, id: BuilderId) -> BuildResult<Vec<Plane>> {
        self.with_builder(id, |data| data.pending_faces.iter().map(|(_, plane)| *plane).collect())
    }

    pub(crate) fn take_pending_edges(&self, id: BuilderId) -> BuildResult<Vec<Shape>> {
        self.with_open_builder_mut(id, |data| std::mem::take(&mut data.pending_edges))
    }

    pub(crate) fn take_pending_faces(&self, id: BuilderId) -> BuildResult<Vec<(Shape, Plane)>> {
        self.with_open_builder_mut(id, |data| std::mem::take(&mut data.pending_faces))
    }

    /// Sub-shapes of a builder's result, or of its latest contribution
    pub fn select(&self, id: BuilderId, kind: ShapeKind, select: Select) -> BuildResult<ShapeList> {
        self.with_builder(id, |data| match select {
            Select::All => data
                .result
                .as_ref()
                .map(|result| result.sub_shapes(kind))
                .unwrap_or_default(),
            Select::Last => data
                .last
                .iter()
                .flat_map(|shape| shape.sub_shapes(kind))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::open_builder_count;
    use crate::shape::Kernel;
    use glam::{DVec2, DVec3};
    use pcad_kernel::{
        BooleanType, CadError, CadKernel, CadResult, CsgKernel, NativeRef, NativeShape,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Reference kernel whose transforms can be made to fail
    struct StiffKernel {
        inner: CsgKernel,
        stiff: Arc<AtomicBool>,
    }

    impl CadKernel for StiffKernel {
        fn name(&self) -> &str {
            "stiff"
        }

        fn is_available(&self) -> bool {
            true
        }

        fn make_vertex(&self, point: DVec3) -> CadResult<NativeRef> {
            self.inner.make_vertex(point)
        }

        fn make_line(&self, start: DVec3, end: DVec3) -> CadResult<NativeRef> {
            self.inner.make_line(start, end)
        }

        fn make_wire(&self, edges: &[NativeRef]) -> CadResult<NativeRef> {
            self.inner.make_wire(edges)
        }

        fn make_circle(&self, radius: f64) -> CadResult<NativeRef> {
            self.inner.make_circle(radius)
        }

        fn make_polygon(&self, points: &[DVec2]) -> CadResult<NativeRef> {
            self.inner.make_polygon(points)
        }

        fn make_disk(&self, radius: f64) -> CadResult<NativeRef> {
            self.inner.make_disk(radius)
        }

        fn make_box(&self, size: DVec3) -> CadResult<NativeRef> {
            self.inner.make_box(size)
        }

        fn make_sphere(&self, radius: f64) -> CadResult<NativeRef> {
            self.inner.make_sphere(radius)
        }

        fn make_cylinder(&self, radius: f64, height: f64) -> CadResult<NativeRef> {
            self.inner.make_cylinder(radius, height)
        }

        fn make_face(&self, edges: &[NativeRef]) -> CadResult<NativeRef> {
            self.inner.make_face(edges)
        }

        fn extrude(&self, face: &dyn NativeShape, direction: DVec3) -> CadResult<NativeRef> {
            self.inner.extrude(face, direction)
        }

        fn transform(&self, shape: &dyn NativeShape, location: &Location) -> CadResult<NativeRef> {
            if self.stiff.load(Ordering::SeqCst) {
                return Err(CadError::OperationFailed("transforms disabled".into()));
            }
            self.inner.transform(shape, location)
        }

        fn boolean(
            &self,
            a: &dyn NativeShape,
            b: &dyn NativeShape,
            op: BooleanType,
        ) -> CadResult<NativeRef> {
            self.inner.boolean(a, b, op)
        }

        fn compound(&self, shapes: &[NativeRef]) -> CadResult<NativeRef> {
            self.inner.compound(shapes)
        }
    }

    fn cube(ctx: &BuildContext, size: f64) -> Shape {
        ctx.kernel().cuboid(DVec3::splat(size)).unwrap()
    }

    #[test]
    fn test_accepts_by_dimension() {
        assert!(BuilderKind::Line.accepts(1));
        assert!(!BuilderKind::Line.accepts(3));
        assert!(BuilderKind::Sketch.accepts(1));
        assert!(!BuilderKind::Sketch.accepts(3));
        assert!(BuilderKind::Part.accepts(2));
        assert!(!BuilderKind::Part.accepts(0));
    }

    #[test]
    fn test_dimension_mismatch_leaves_builder_untouched() {
        let ctx = BuildContext::new();
        let id = ctx.enter_builder(BuilderKind::Line, BuilderOptions::default()).unwrap();
        let err = ctx.accept(id, vec![cube(&ctx, 1.0)], Mode::Add);
        assert!(matches!(
            err,
            Err(BuildError::DimensionMismatch { found: 3, .. })
        ));
        assert!(ctx.builder_result(id).unwrap().is_none());
        ctx.close_builder(id, Closing::Strict).unwrap();
    }

    #[test]
    fn test_line_rejects_boolean_modes() {
        let ctx = BuildContext::new();
        let id = ctx.enter_builder(BuilderKind::Line, BuilderOptions::default()).unwrap();
        let edge = ctx.kernel().line(DVec3::ZERO, DVec3::X).unwrap();
        ctx.accept(id, vec![edge.clone()], Mode::Add).unwrap();
        assert!(matches!(
            ctx.accept(id, vec![edge], Mode::Subtract),
            Err(BuildError::ModeNotSupported { .. })
        ));
        ctx.close_builder(id, Closing::Strict).unwrap();
    }

    #[test]
    fn test_subtract_into_empty_part_fails() {
        let ctx = BuildContext::new();
        let id = ctx.enter_builder(BuilderKind::Part, BuilderOptions::default()).unwrap();
        assert!(matches!(
            ctx.accept(id, vec![cube(&ctx, 1.0)], Mode::Subtract),
            Err(BuildError::EmptyBase { mode: Mode::Subtract })
        ));
        ctx.close_builder(id, Closing::Strict).unwrap();
    }

    #[test]
    fn test_closed_builder_rejects_input() {
        let ctx = BuildContext::new();
        let id = ctx.enter_builder(BuilderKind::Part, BuilderOptions::default()).unwrap();
        ctx.accept(id, vec![cube(&ctx, 1.0)], Mode::Add).unwrap();
        ctx.close_builder(id, Closing::Strict).unwrap();
        assert_eq!(ctx.builder_state(id).unwrap(), BuilderState::Closed);
        assert!(matches!(
            ctx.accept(id, vec![cube(&ctx, 2.0)], Mode::Add),
            Err(BuildError::BuilderClosed(BuilderKind::Part))
        ));
        assert!(matches!(
            ctx.close_builder(id, Closing::Strict),
            Err(BuildError::BuilderClosed(_))
        ));
        assert_eq!(ctx.depth(StackKind::Builders), 0);
    }

    #[test]
    fn test_strict_close_out_of_order() {
        let ctx = BuildContext::new();
        let outer = ctx.enter_builder(BuilderKind::Part, BuilderOptions::default()).unwrap();
        let inner = ctx.enter_builder(BuilderKind::Part, BuilderOptions::default()).unwrap();
        assert!(matches!(
            ctx.close_builder(outer, Closing::Strict),
            Err(BuildError::OutOfOrderExit { stack: StackKind::Builders, .. })
        ));
        assert_eq!(ctx.builder_state(outer).unwrap(), BuilderState::Open);
        ctx.close_builder(inner, Closing::Strict).unwrap();
        ctx.close_builder(outer, Closing::Strict).unwrap();
    }

    #[test]
    fn test_builder_planes_are_pushed_and_released() {
        let ctx = BuildContext::new();
        let id = ctx
            .enter_builder(BuilderKind::Part, BuilderOptions::default().on(Plane::XZ))
            .unwrap();
        assert_eq!(ctx.depth(StackKind::Workplanes), 1);
        assert_eq!(ctx.current_workplanes(), vec![Plane::XZ]);
        ctx.close_builder(id, Closing::Strict).unwrap();
        assert_eq!(ctx.depth(StackKind::Workplanes), 0);
    }

    #[test]
    fn test_select_last() {
        let ctx = BuildContext::new();
        let id = ctx.enter_builder(BuilderKind::Part, BuilderOptions::default()).unwrap();
        ctx.accept(id, vec![cube(&ctx, 4.0)], Mode::Add).unwrap();
        let small = cube(&ctx, 1.0)
            .moved(&Location::from_translation((10.0, 0.0, 0.0)))
            .unwrap();
        ctx.accept(id, vec![small], Mode::Add).unwrap();
        let last = ctx.select(id, ShapeKind::Solid, Select::Last).unwrap();
        assert_eq!(last.len(), 1);
        assert!((last[0].center().x - 10.0).abs() < 1e-9);
        let all = ctx.select(id, ShapeKind::Solid, Select::All).unwrap();
        assert_eq!(all.len(), 2);
        ctx.close_builder(id, Closing::Strict).unwrap();
    }

    #[test]
    fn test_failed_placement_still_closes_builder() {
        let stiff = Arc::new(AtomicBool::new(false));
        let kernel = Kernel::new(StiffKernel {
            inner: CsgKernel::default(),
            stiff: Arc::clone(&stiff),
        });
        let ctx = BuildContext::with_kernel(kernel);
        let before = open_builder_count();
        let id = ctx.enter_builder(BuilderKind::Sketch, BuilderOptions::default()).unwrap();
        let disk = ctx.kernel().disk(1.0).unwrap();
        ctx.accept(id, vec![disk], Mode::Add).unwrap();

        stiff.store(true, Ordering::SeqCst);
        assert!(matches!(
            ctx.close_builder(id, Closing::Strict),
            Err(BuildError::Cad(CadError::OperationFailed(_)))
        ));
        assert_eq!(ctx.builder_state(id).unwrap(), BuilderState::Closed);
        assert_eq!(ctx.depth(StackKind::Builders), 0);
        assert_eq!(open_builder_count(), before);
        assert!(ctx.placed_result(id).unwrap().is_none());
    }
}

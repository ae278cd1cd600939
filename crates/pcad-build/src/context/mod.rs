//! Scoped stack registry
//!
//! A [`BuildContext`] owns three independent LIFO stacks (locations,
//! workplanes and builders) plus the arena of builder states. Scopes are
//! entered through RAII guards that pop their frame on every exit path.
//!
//! Nested frames combine as a cross product in which the outer frame varies
//! slowest and the inner frame fastest.

mod locations;
mod stack;

pub use locations::{GridLocations, Locations, PolarLocations, Workplanes};
pub use stack::{FrameToken, StackKind};

pub(crate) use stack::{ScopeStack, cross_product};

use std::cell::{Cell, RefCell};

use pcad_kernel::{Location, Plane};

use crate::builder::{BuilderData, BuilderId, BuilderKind};
use crate::config::BuildConfig;
use crate::error::{BuildError, BuildResult};
use crate::mode::Mode;
use crate::objects::BuildObject;
use crate::shape::{Kernel, Shape};

thread_local! {
    static OPEN_BUILDERS: Cell<usize> = const { Cell::new(0) };
}

/// Number of builder scopes currently open on this thread, across all contexts
pub fn open_builder_count() -> usize {
    OPEN_BUILDERS.with(Cell::get)
}

pub(crate) fn note_builder_opened() {
    OPEN_BUILDERS.with(|count| count.set(count.get() + 1));
}

pub(crate) fn note_builder_closed() {
    OPEN_BUILDERS.with(|count| count.set(count.get().saturating_sub(1)));
}

/// Stack depths above which a builder's local frames start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct FrameBase {
    pub locations: usize,
    pub workplanes: usize,
}

/// One entry on the builders stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BuilderFrame {
    pub kind: BuilderKind,
    pub id: BuilderId,
}

/// The state shared by every scope of one build
///
/// Not `Sync`: a context belongs to the thread that created it.
#[derive(Debug)]
pub struct BuildContext {
    kernel: Kernel,
    config: BuildConfig,
    pub(crate) locations: RefCell<ScopeStack<Vec<Location>>>,
    pub(crate) workplanes: RefCell<ScopeStack<Vec<Plane>>>,
    pub(crate) builders: RefCell<ScopeStack<BuilderFrame>>,
    pub(crate) arena: RefCell<Vec<BuilderData>>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildContext {
    /// Context using the reference kernel and default settings
    pub fn new() -> Self {
        Self::with_config(Kernel::csg(), BuildConfig::default())
    }

    /// Context using the reference kernel configured from `config`
    pub fn from_config(config: BuildConfig) -> Self {
        Self::with_config(Kernel::csg_with(config.kernel_config()), config)
    }

    pub fn with_kernel(kernel: Kernel) -> Self {
        Self::with_config(kernel, BuildConfig::default())
    }

    pub fn with_config(kernel: Kernel, config: BuildConfig) -> Self {
        Self {
            kernel,
            config,
            locations: RefCell::new(ScopeStack::new(StackKind::Locations)),
            workplanes: RefCell::new(ScopeStack::new(StackKind::Workplanes)),
            builders: RefCell::new(ScopeStack::new(StackKind::Builders)),
            arena: RefCell::new(Vec::new()),
        }
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Number of frames on a stack
    pub fn depth(&self, kind: StackKind) -> usize {
        match kind {
            StackKind::Locations => self.locations.borrow().depth(),
            StackKind::Workplanes => self.workplanes.borrow().depth(),
            StackKind::Builders => self.builders.borrow().depth(),
        }
    }

    /// Effective locations: the cross product of every active location frame
    pub fn current_locations(&self) -> Vec<Location> {
        cross_product(self.locations.borrow().values(), Location::IDENTITY, |a, b| {
            *a * *b
        })
    }

    /// Effective workplanes; inner planes are expressed in the outer plane's frame
    pub fn current_workplanes(&self) -> Vec<Plane> {
        cross_product(self.workplanes.borrow().values(), Plane::XY, |outer, inner| {
            outer.relocated(&inner.location())
        })
    }

    /// Depths of the location and workplane stacks right now
    pub(crate) fn frame_base(&self) -> FrameBase {
        FrameBase {
            locations: self.locations.borrow().depth(),
            workplanes: self.workplanes.borrow().depth(),
        }
    }

    /// Every workplane combined with every location, drawn from the frames
    /// at `base` and above; workplanes vary slowest
    pub(crate) fn placements_from(&self, base: FrameBase) -> Vec<Location> {
        let locations = cross_product(
            self.locations.borrow().values_from(base.locations),
            Location::IDENTITY,
            |a, b| *a * *b,
        );
        let workplanes = self.workplanes.borrow();
        if workplanes.depth() <= base.workplanes {
            return locations;
        }
        let planes = cross_product(
            workplanes.values_from(base.workplanes),
            Plane::XY,
            |outer, inner| outer.relocated(&inner.location()),
        );
        planes
            .iter()
            .flat_map(|plane| {
                let frame = plane.location();
                locations.iter().map(move |location| frame * *location)
            })
            .collect()
    }

    /// Placements drawn from every frame
    pub(crate) fn global_placements(&self) -> Vec<Location> {
        self.placements_from(FrameBase::default())
    }

    /// Push a location frame; prefer the [`Locations`] guard
    ///
    /// Every value is validated first, so a non-finite location never
    /// reaches the stack.
    pub(crate) fn push_locations(&self, values: Vec<Location>) -> BuildResult<FrameToken> {
        if values.is_empty() {
            return Err(BuildError::EmptyFrame(StackKind::Locations));
        }
        let values = values
            .into_iter()
            .map(Location::validated)
            .collect::<Result<Vec<_>, _>>()?;
        let count = values.len();
        let token = self.locations.borrow_mut().push(values);
        tracing::debug!("enter Locations {token} ({count} values)");
        Ok(token)
    }

    /// Push a workplane frame; prefer the [`Workplanes`] guard
    pub(crate) fn push_workplanes(&self, values: Vec<Plane>) -> BuildResult<FrameToken> {
        if values.is_empty() {
            return Err(BuildError::EmptyFrame(StackKind::Workplanes));
        }
        let count = values.len();
        let token = self.workplanes.borrow_mut().push(values);
        tracing::debug!("enter Workplanes {token} ({count} values)");
        Ok(token)
    }

    /// Pop a location or workplane frame, which must be on top
    pub(crate) fn exit_scope(&self, kind: StackKind, token: FrameToken) -> BuildResult<()> {
        match kind {
            StackKind::Locations => {
                self.locations.borrow_mut().pop(token)?;
            }
            StackKind::Workplanes => {
                self.workplanes.borrow_mut().pop(token)?;
            }
            StackKind::Builders => {
                self.builders.borrow_mut().pop(token)?;
            }
        }
        tracing::debug!("exit {kind} {token}");
        Ok(())
    }

    /// Remove a frame wherever it sits in its stack
    pub(crate) fn force_exit_scope(&self, kind: StackKind, token: FrameToken) {
        let removed = match kind {
            StackKind::Locations => self.locations.borrow_mut().remove(token).is_some(),
            StackKind::Workplanes => self.workplanes.borrow_mut().remove(token).is_some(),
            StackKind::Builders => self.builders.borrow_mut().remove(token).is_some(),
        };
        if removed {
            tracing::debug!("forced exit of {kind} {token}");
        }
    }

    /// Nearest enclosing open builder of the given kind
    pub fn topmost_builder(&self, kind: BuilderKind) -> Option<BuilderId> {
        self.builders
            .borrow()
            .values()
            .rev()
            .find(|frame| frame.kind == kind)
            .map(|frame| frame.id)
    }

    /// Open builders, outermost first
    pub fn active_builders(&self) -> Vec<(BuilderKind, BuilderId)> {
        self.builders
            .borrow()
            .values()
            .map(|frame| (frame.kind, frame.id))
            .collect()
    }

    pub(crate) fn describe_active(&self) -> String {
        self.active_builders()
            .iter()
            .map(|(kind, id)| format!("{kind}{id}"))
            .collect::<Vec<_>>()
            .join(" > ")
    }

    pub(crate) fn no_builder(&self, operation: &'static str, required: BuilderKind) -> BuildError {
        BuildError::NoBuilder {
            operation,
            required,
            active: self.describe_active(),
        }
    }

    /// Copies of `shape` at every placement of a builder
    pub(crate) fn place(&self, id: BuilderId, shape: &Shape) -> BuildResult<Vec<Shape>> {
        self.placements_for(id)?
            .iter()
            .map(|location| Ok(shape.moved(location)?))
            .collect()
    }

    /// Build an object and route it to the nearest builder of its kind
    ///
    /// With no builder open at all the object is built standalone, at every
    /// effective workplane and location. Returns the placed shapes.
    pub fn add<O: BuildObject + ?Sized>(&self, object: &O) -> BuildResult<Vec<Shape>> {
        let kind = object.builder_kind();
        let target = self.topmost_builder(kind);
        if target.is_none() && self.depth(StackKind::Builders) > 0 {
            return Err(self.no_builder(object.name(), kind));
        }

        let shape = object.build(&self.kernel)?;
        match target {
            Some(id) => {
                let placed = self.place(id, &shape)?;
                self.accept(id, placed, object.mode())
            }
            None => self
                .global_placements()
                .iter()
                .map(|location| Ok(shape.moved(location)?))
                .collect(),
        }
    }

    /// Add an existing shape to the nearest builder that takes its dimension
    pub fn add_shape(&self, shape: &Shape, mode: Mode) -> BuildResult<Vec<Shape>> {
        let dimension = shape.dimension();
        let target = self
            .builders
            .borrow()
            .values()
            .rev()
            .find(|frame| frame.kind.accepts(dimension))
            .map(|frame| frame.id);
        match target {
            Some(id) => {
                let placed = self.place(id, shape)?;
                self.accept(id, placed, mode)
            }
            None => Err(self.no_builder("add_shape", BuilderKind::for_dimension(dimension))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use pcad_kernel::GeomError;

    #[test]
    fn test_empty_context_has_identity_frames() {
        let ctx = BuildContext::new();
        assert_eq!(ctx.current_locations(), vec![Location::IDENTITY]);
        assert_eq!(ctx.current_workplanes(), vec![Plane::XY]);
        assert_eq!(ctx.global_placements(), vec![Location::IDENTITY]);
        assert!(ctx.topmost_builder(BuilderKind::Part).is_none());
    }

    #[test]
    fn test_push_and_exit_frames() {
        let ctx = BuildContext::new();
        let outer = ctx
            .push_locations(vec![
                Location::from_translation((1.0, 0.0, 0.0)),
                Location::from_translation((2.0, 0.0, 0.0)),
            ])
            .unwrap();
        let inner = ctx
            .push_locations(vec![Location::from_translation((0.0, 5.0, 0.0))])
            .unwrap();
        let current = ctx.current_locations();
        assert_eq!(current.len(), 2);
        assert!(current[1].position().abs_diff_eq(DVec3::new(2.0, 5.0, 0.0), 1e-12));

        assert!(matches!(
            ctx.exit_scope(StackKind::Locations, outer),
            Err(BuildError::OutOfOrderExit { .. })
        ));
        ctx.exit_scope(StackKind::Locations, inner).unwrap();
        ctx.exit_scope(StackKind::Locations, outer).unwrap();
        assert_eq!(ctx.depth(StackKind::Locations), 0);
    }

    #[test]
    fn test_degenerate_location_rejected() {
        let ctx = BuildContext::new();
        let err = ctx.push_locations(vec![
            Location::from_translation((1.0, 0.0, 0.0)),
            Location::from_translation((f64::NAN, 0.0, 0.0)),
        ]);
        assert!(matches!(
            err,
            Err(BuildError::Geom(GeomError::DegenerateLocation(_)))
        ));
        assert_eq!(ctx.depth(StackKind::Locations), 0);
    }

    #[test]
    fn test_empty_frame_rejected() {
        let ctx = BuildContext::new();
        assert!(matches!(
            ctx.push_workplanes(Vec::new()),
            Err(BuildError::EmptyFrame(StackKind::Workplanes))
        ));
    }

    #[test]
    fn test_single_workplane_frame_is_exact() {
        let ctx = BuildContext::new();
        let tilted = Plane::XY.rotated_deg((30.0, 0.0, 45.0));
        ctx.push_workplanes(vec![Plane::XZ, tilted]).unwrap();
        assert_eq!(ctx.current_workplanes(), vec![Plane::XZ, tilted]);
    }

    #[test]
    fn test_workplanes_compose_in_outer_frame() {
        let ctx = BuildContext::new();
        ctx.push_workplanes(vec![Plane::XZ]).unwrap();
        ctx.push_workplanes(vec![Plane::XY.offset(2.0)]).unwrap();
        let planes = ctx.current_workplanes();
        assert_eq!(planes.len(), 1);
        // XZ's normal is -Y, so offsetting along the inner normal moves to y = -2
        assert!(planes[0].origin().abs_diff_eq(DVec3::new(0.0, -2.0, 0.0), 1e-12));
        assert!(planes[0].z_dir().abs_diff_eq(DVec3::NEG_Y, 1e-12));
    }
}

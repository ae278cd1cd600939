//! Location and workplane scope guards

use glam::DVec3;
use pcad_kernel::{Location, Plane};

use super::{BuildContext, FrameToken, StackKind};
use crate::error::BuildResult;

/// Pops one frame when dropped
#[derive(Debug)]
struct ScopeGuard<'a> {
    ctx: &'a BuildContext,
    kind: StackKind,
    token: Option<FrameToken>,
}

impl ScopeGuard<'_> {
    /// On failure the token is kept so that drop can force the frame out
    fn exit(&mut self) -> BuildResult<()> {
        let Some(token) = self.token else {
            return Ok(());
        };
        self.ctx.exit_scope(self.kind, token)?;
        self.token = None;
        Ok(())
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        if let Err(e) = self.ctx.exit_scope(self.kind, token) {
            tracing::error!("{e}; removing the frame anyway");
            self.ctx.force_exit_scope(self.kind, token);
        }
    }
}

/// An active frame of locations
///
/// Objects added while the guard is alive are placed at every location in
/// the frame, combined with every enclosing frame.
#[derive(Debug)]
pub struct Locations<'a> {
    guard: ScopeGuard<'a>,
}

impl<'a> Locations<'a> {
    pub fn enter<I, L>(ctx: &'a BuildContext, values: I) -> BuildResult<Self>
    where
        I: IntoIterator<Item = L>,
        L: Into<Location>,
    {
        let values: Vec<Location> = values.into_iter().map(Into::into).collect();
        let token = ctx.push_locations(values)?;
        Ok(Self {
            guard: ScopeGuard {
                ctx,
                kind: StackKind::Locations,
                token: Some(token),
            },
        })
    }

    /// Leave the scope, reporting an out-of-order exit instead of forcing it
    pub fn exit(mut self) -> BuildResult<()> {
        self.guard.exit()
    }

    pub fn token(&self) -> Option<FrameToken> {
        self.guard.token
    }
}

/// A rectangular grid of locations in the XY plane
///
/// X varies slowest. Each axis is centered on the origin unless told otherwise.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLocations {
    pub x_spacing: f64,
    pub y_spacing: f64,
    pub x_count: usize,
    pub y_count: usize,
    pub centered: (bool, bool),
}

impl GridLocations {
    pub fn new(x_spacing: f64, y_spacing: f64, x_count: usize, y_count: usize) -> Self {
        Self {
            x_spacing,
            y_spacing,
            x_count,
            y_count,
            centered: (true, true),
        }
    }

    pub fn centered(mut self, x: bool, y: bool) -> Self {
        self.centered = (x, y);
        self
    }

    pub fn locations(&self) -> Vec<Location> {
        let offset = |spacing: f64, count: usize, centered: bool| {
            if centered && count > 0 {
                spacing * (count - 1) as f64 / 2.0
            } else {
                0.0
            }
        };
        let x0 = offset(self.x_spacing, self.x_count, self.centered.0);
        let y0 = offset(self.y_spacing, self.y_count, self.centered.1);

        let mut locations = Vec::with_capacity(self.x_count * self.y_count);
        for i in 0..self.x_count {
            for j in 0..self.y_count {
                locations.push(Location::from_translation((
                    i as f64 * self.x_spacing - x0,
                    j as f64 * self.y_spacing - y0,
                    0.0,
                )));
            }
        }
        locations
    }

    /// Push the grid as a location frame
    pub fn enter<'a>(&self, ctx: &'a BuildContext) -> BuildResult<Locations<'a>> {
        Locations::enter(ctx, self.locations())
    }
}

/// Locations evenly spaced on a circle in the XY plane
#[derive(Debug, Clone, PartialEq)]
pub struct PolarLocations {
    pub radius: f64,
    pub count: usize,
    /// Degrees, measured from +X
    pub start_angle: f64,
    /// Degrees covered by the pattern
    pub angular_range: f64,
    /// Turn each location to face outward
    pub rotate: bool,
}

impl PolarLocations {
    pub fn new(radius: f64, count: usize) -> Self {
        Self {
            radius,
            count,
            start_angle: 0.0,
            angular_range: 360.0,
            rotate: true,
        }
    }

    pub fn start_angle(mut self, degrees: f64) -> Self {
        self.start_angle = degrees;
        self
    }

    pub fn angular_range(mut self, degrees: f64) -> Self {
        self.angular_range = degrees;
        self
    }

    pub fn rotate(mut self, rotate: bool) -> Self {
        self.rotate = rotate;
        self
    }

    pub fn locations(&self) -> Vec<Location> {
        if self.count == 0 {
            return Vec::new();
        }
        let step = self.angular_range / self.count as f64;
        (0..self.count)
            .map(|i| {
                let angle = self.start_angle + step * i as f64;
                let (sin, cos) = angle.to_radians().sin_cos();
                let position = DVec3::new(self.radius * cos, self.radius * sin, 0.0);
                let rotation = if self.rotate { angle } else { 0.0 };
                Location::from_euler_deg(position, (0.0, 0.0, rotation))
            })
            .collect()
    }

    /// Push the pattern as a location frame
    pub fn enter<'a>(&self, ctx: &'a BuildContext) -> BuildResult<Locations<'a>> {
        Locations::enter(ctx, self.locations())
    }
}

/// An active frame of workplanes
#[derive(Debug)]
pub struct Workplanes<'a> {
    guard: ScopeGuard<'a>,
}

impl<'a> Workplanes<'a> {
    pub fn enter(ctx: &'a BuildContext, planes: impl IntoIterator<Item = Plane>) -> BuildResult<Self> {
        let token = ctx.push_workplanes(planes.into_iter().collect())?;
        Ok(Self {
            guard: ScopeGuard {
                ctx,
                kind: StackKind::Workplanes,
                token: Some(token),
            },
        })
    }

    pub fn exit(mut self) -> BuildResult<()> {
        self.guard.exit()
    }

    pub fn token(&self) -> Option<FrameToken> {
        self.guard.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use approx::assert_abs_diff_eq;

    fn xs(locations: &[Location]) -> Vec<f64> {
        locations.iter().map(|l| l.position().x).collect()
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let ctx = BuildContext::new();
        {
            let _outer = Locations::enter(&ctx, [(1.0, 0.0, 0.0), (2.0, 0.0, 0.0)]).unwrap();
            assert_eq!(ctx.current_locations().len(), 2);
        }
        assert_eq!(ctx.depth(StackKind::Locations), 0);
        assert_eq!(ctx.current_locations(), vec![Location::IDENTITY]);
    }

    #[test]
    fn test_explicit_exit_out_of_order() {
        let ctx = BuildContext::new();
        let outer = Locations::enter(&ctx, [(1.0, 0.0, 0.0)]).unwrap();
        let inner = Locations::enter(&ctx, [(0.0, 1.0, 0.0)]).unwrap();
        assert!(matches!(
            outer.exit(),
            Err(BuildError::OutOfOrderExit { .. })
        ));
        // the failed exit dropped the outer guard, which forced its frame out
        assert_eq!(ctx.depth(StackKind::Locations), 1);
        inner.exit().unwrap();
        assert_eq!(ctx.depth(StackKind::Locations), 0);
    }

    #[test]
    fn test_grid_order_and_centering() {
        let grid = GridLocations::new(10.0, 5.0, 2, 3);
        let locations = grid.locations();
        assert_eq!(locations.len(), 6);
        assert_eq!(xs(&locations), vec![-5.0, -5.0, -5.0, 5.0, 5.0, 5.0]);
        let ys: Vec<f64> = locations.iter().map(|l| l.position().y).collect();
        assert_eq!(ys, vec![-5.0, 0.0, 5.0, -5.0, 0.0, 5.0]);

        let corner = GridLocations::new(1.0, 1.0, 2, 1).centered(false, false);
        assert_eq!(xs(&corner.locations()), vec![0.0, 1.0]);
    }

    #[test]
    fn test_polar_locations_rotate_outward() {
        let polar = PolarLocations::new(2.0, 4);
        let locations = polar.locations();
        assert_eq!(locations.len(), 4);
        let second = locations[1];
        assert_abs_diff_eq!(second.position().x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(second.position().y, 2.0, epsilon = 1e-12);
        let outward = second.transform_vector(DVec3::X);
        assert!(outward.abs_diff_eq(DVec3::Y, 1e-12));

        let fixed = PolarLocations::new(2.0, 4).rotate(false).locations();
        assert!(fixed[1].transform_vector(DVec3::X).abs_diff_eq(DVec3::X, 1e-12));
    }

    #[test]
    fn test_empty_pattern_is_rejected() {
        let ctx = BuildContext::new();
        assert!(matches!(
            GridLocations::new(1.0, 1.0, 0, 3).enter(&ctx),
            Err(BuildError::EmptyFrame(StackKind::Locations))
        ));
    }

    #[test]
    fn test_nested_grid_cross_product() {
        let ctx = BuildContext::new();
        let _outer = Locations::enter(&ctx, [(100.0, 0.0, 0.0), (200.0, 0.0, 0.0)]).unwrap();
        let _inner = GridLocations::new(1.0, 1.0, 3, 1).enter(&ctx).unwrap();
        assert_eq!(
            xs(&ctx.current_locations()),
            vec![99.0, 100.0, 101.0, 199.0, 200.0, 201.0]
        );
    }
}

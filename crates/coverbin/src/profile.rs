//! Grid profile provider.
//!
//! Supplies the unit-cell geometry every other stage builds on: the base foot
//! cross-section, the wall and stacking-lip cross-sections, rounded
//! footprints, and sweeps of a cross-section around a footprint.
//!
//! Wall cross-sections use `(u, w)` coordinates: `u` is the inward distance
//! from the outer face, `w` the height. [`ProfileProvider::sweep_rounded`]
//! wraps such a section around a rounded rectangle, so the same section can
//! describe the bin lip, the lid lip, or the foot.
//!
//! All calls take an explicit [`GridContext`]; there is no ambient state.

use crate::params::BuildParameters;
use crate::{Profile, Solid};
use nalgebra::Vector2;

/// Unit cell pitch.
pub const GRID_PITCH: f64 = 42.0;
/// One height increment.
pub const HEIGHT_UNIT: f64 = 7.0;
/// Outer size is `n * GRID_PITCH - GRID_CLEARANCE`.
pub const GRID_CLEARANCE: f64 = 0.5;
/// Footprint corner radius.
pub const OUTER_RADIUS: f64 = 3.75;
/// Height of the base foot.
pub const BASE_HEIGHT: f64 = 5.0;
/// Floor plate above the foot.
pub const FLOOR_THICKNESS: f64 = 1.2;
/// Outer wall thickness.
pub const WALL_THICKNESS: f64 = 0.95;
/// Stacking lip height above the body.
pub const LIP_HEIGHT: f64 = 4.4;
/// Inward extent of the stacking lip.
pub const LIP_WIDTH: f64 = 2.6;
/// Depth of the 45° support under the lip.
pub const LIP_SUPPORT: f64 = 1.65;
/// Inward extent of the region the lid rim occupies.
pub const SEAT_WIDTH: f64 = 3.4;
/// Lid plate thickness.
pub const LID_THICKNESS: f64 = 2.0;
/// Wall between adjacent pockets.
pub const SEPARATOR_THICKNESS: f64 = 1.2;
/// Snap tab boss width (along the face).
pub const TAB_WIDTH: f64 = 6.0;
/// Snap tab boss height.
pub const TAB_HEIGHT: f64 = 1.2;
/// How far a boss stands proud of the lip face.
pub const TAB_DEPTH: f64 = 0.6;
/// Arc segments for sweeps and circles.
pub const SEGMENTS: u32 = 48;

/// Explicit grid and height context for every profile call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridContext {
    /// Cells along X.
    pub grid_x: u32,
    /// Cells along Y.
    pub grid_y: u32,
    /// z of the wall top, where the lip begins.
    pub body_height: f64,
}

impl GridContext {
    /// Context for a validated parameter set.
    pub fn from_params(params: &BuildParameters) -> Self {
        Self {
            grid_x: params.grid_x,
            grid_y: params.grid_y,
            body_height: params.height.body_height(),
        }
    }

    /// Outer width along X.
    pub fn width(&self) -> f64 {
        f64::from(self.grid_x) * GRID_PITCH - GRID_CLEARANCE
    }

    /// Outer depth along Y.
    pub fn depth(&self) -> f64 {
        f64::from(self.grid_y) * GRID_PITCH - GRID_CLEARANCE
    }

    /// Top of the floor plate.
    pub fn floor_top(&self) -> f64 {
        BASE_HEIGHT + FLOOR_THICKNESS
    }

    /// Top of the stacking lip.
    pub fn lip_top(&self) -> f64 {
        self.body_height + LIP_HEIGHT
    }
}

/// A rounded rectangle centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    /// Extent along X.
    pub width: f64,
    /// Extent along Y.
    pub depth: f64,
    /// Corner radius.
    pub radius: f64,
}

impl Footprint {
    /// Outer footprint of a bin.
    pub fn outer(ctx: &GridContext) -> Self {
        Self {
            width: ctx.width(),
            depth: ctx.depth(),
            radius: OUTER_RADIUS,
        }
    }

    /// Footprint of a single base cell.
    pub fn cell() -> Self {
        Self {
            width: GRID_PITCH - GRID_CLEARANCE,
            depth: GRID_PITCH - GRID_CLEARANCE,
            radius: OUTER_RADIUS,
        }
    }

    /// Shrink every side by `d` (grow for negative `d`).
    pub fn inset(&self, d: f64) -> Self {
        Self {
            width: self.width - 2.0 * d,
            depth: self.depth - 2.0 * d,
            radius: (self.radius - d).max(0.0),
        }
    }

    /// Extents as a vector.
    pub fn size(&self) -> Vector2<f64> {
        Vector2::new(self.width, self.depth)
    }

    /// Filled outline: a rectangle with corners rounded by `radius`.
    pub fn outline(&self) -> Profile {
        let core = self.inset(self.radius);
        Profile::rect(core.width, core.depth).offset(self.radius)
    }
}

/// Source of grid geometry.
///
/// The rest of the crate only sees this trait, so a different grid system can
/// be plugged in without touching the fit engine.
pub trait ProfileProvider {
    /// Foot cross-section in `(u, z)`, `z` from 0 to [`BASE_HEIGHT`].
    fn base_profile(&self, ctx: &GridContext) -> Profile;

    /// Outer wall cross-section in `(u, z)`, from the foot to the body top.
    fn wall_profile(&self, ctx: &GridContext) -> Profile;

    /// Nominal stacking lip in `(u, w)`, `w` measured from the body top.
    fn lip_profile(&self, ctx: &GridContext) -> Profile;

    /// Filled rounded rectangle.
    fn rounded_rect(&self, footprint: &Footprint) -> Profile;

    /// Wrap a `(u, w)` section around a footprint; `w` maps to `z`.
    fn sweep_rounded(&self, section: &Profile, footprint: &Footprint) -> Solid;

    /// Replicate a single-cell solid over the grid, centered at the origin.
    fn grid_cells(&self, cell: &Solid, ctx: &GridContext) -> Solid;

    /// All base feet.
    fn base_grid(&self, ctx: &GridContext) -> Solid {
        let cell = Footprint::cell();
        let core = cell.inset(cell.radius);
        let foot = self
            .sweep_rounded(&self.base_profile(ctx), &cell)
            .union(
                &Solid::cube(core.width, core.depth, BASE_HEIGHT).translate(
                    0.0,
                    0.0,
                    BASE_HEIGHT / 2.0,
                ),
            )
            .named("foot");
        self.grid_cells(&foot, ctx)
    }
}

/// The standard 42 mm grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridProfiles;

impl ProfileProvider for GridProfiles {
    fn base_profile(&self, _ctx: &GridContext) -> Profile {
        let r = OUTER_RADIUS;
        Profile::polygon([
            (r, 0.0),
            (2.95, 0.0),
            (2.15, 0.8),
            (2.15, 2.6),
            (0.0, 4.75),
            (0.0, BASE_HEIGHT),
            (r, BASE_HEIGHT),
        ])
        .named("base_profile")
    }

    fn wall_profile(&self, ctx: &GridContext) -> Profile {
        let h = ctx.body_height - BASE_HEIGHT;
        Profile::rect(WALL_THICKNESS, h)
            .translate(WALL_THICKNESS / 2.0, BASE_HEIGHT + h / 2.0)
            .named("wall_profile")
    }

    fn lip_profile(&self, _ctx: &GridContext) -> Profile {
        Profile::polygon([
            (0.0, -LIP_SUPPORT),
            (WALL_THICKNESS, -LIP_SUPPORT),
            (LIP_WIDTH, 0.0),
            (0.7, 1.9),
            (0.7, 3.7),
            (0.0, LIP_HEIGHT),
        ])
        .named("lip_profile")
    }

    fn rounded_rect(&self, footprint: &Footprint) -> Profile {
        footprint.outline()
    }

    fn sweep_rounded(&self, section: &Profile, footprint: &Footprint) -> Solid {
        let r = footprint.radius;
        let cx = footprint.width / 2.0 - r;
        let cy = footprint.depth / 2.0 - r;
        let lx = 2.0 * cx;
        let ly = 2.0 * cy;

        // (u, w) -> (-u, w) so the extrusion below is a proper rotation.
        let mirrored = section.mirror_x();

        let side_y = mirrored
            .extrude(lx)
            .rotate(90.0, 0.0, 90.0)
            .translate(-lx / 2.0, footprint.depth / 2.0, 0.0);
        let side_x = mirrored
            .extrude(ly)
            .rotate(90.0, 0.0, 0.0)
            .translate(footprint.width / 2.0, ly / 2.0, 0.0);

        let corner = section.mirror_x().translate(r, 0.0).revolve(90.0, SEGMENTS);
        let corners = [(cx, cy), (-cx, cy), (-cx, -cy), (cx, -cy)]
            .iter()
            .enumerate()
            .map(|(k, &(x, y))| corner.rotate(0.0, 0.0, 90.0 * k as f64).translate(x, y, 0.0))
            .collect::<Vec<_>>();

        Solid::union_all(
            [
                side_y.clone(),
                side_y.rotate(0.0, 0.0, 180.0),
                side_x.clone(),
                side_x.rotate(0.0, 0.0, 180.0),
            ]
            .iter()
            .chain(corners.iter()),
        )
    }

    fn grid_cells(&self, cell: &Solid, ctx: &GridContext) -> Solid {
        cell.grid_pattern(
            [ctx.grid_x, ctx.grid_y],
            Vector2::new(GRID_PITCH, GRID_PITCH),
        )
    }
}
